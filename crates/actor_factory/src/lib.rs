//! # Actor Factory
//!
//! CARLA connection and asset factory module.
//!
//! Responsibilities:
//! - Own the simulator connection (connect / configure / tick / teardown)
//! - Spawn the vehicle fleet with its camera and GNSS sensors
//! - Destroy actors, ignoring failures
//! - Provide the unified `SensorSource` abstraction
//! - Provide an in-process mock simulator
//!
//! ## Feature Flags
//!
//! - `real-carla`: Enable real CARLA client (requires carla crate)

pub mod client;
pub mod error;
pub mod factory;
pub mod fleet;
pub mod mock_client;
pub mod mock_sensor;

#[cfg(feature = "real-carla")]
pub mod carla_client;
#[cfg(feature = "real-carla")]
pub mod carla_sensor_source;
#[cfg(feature = "real-carla")]
pub mod sensor_data_converter;

pub use client::SimulatorClient;
pub use contracts::{ActorId, SensorSource, Transform, WorldSettings};
pub use error::{ActorFactoryError, Result};
pub use factory::ActorFactory;
pub use fleet::{CameraSpec, Fleet, FleetSpec, SpawnedVehicle};
pub use mock_client::{MockConfig, MockSimulatorClient};
pub use mock_sensor::MockSensor;

#[cfg(feature = "real-carla")]
pub use carla_client::RealCarlaClient;
#[cfg(feature = "real-carla")]
pub use carla_sensor_source::CarlaSensorSource;
