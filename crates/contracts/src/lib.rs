//! # Contracts
//!
//! Frozen interface contracts shared by every bridge crate: the data model
//! that crosses crate boundaries and the capability traits that hide the
//! simulator, the detection model and the sensor callbacks.
//! Business crates depend on this crate, never the other way around.
//!
//! ## Time Model
//! - Sensor packets carry the CARLA simulation timestamp (seconds, f64)
//! - Outbound messages carry wall-clock seconds since the UNIX epoch

mod detection;
mod error;
mod message;
mod runtime;
mod sensor;
mod sensor_source;

pub use detection::*;
pub use error::*;
pub use message::*;
pub use runtime::*;
pub use sensor::*;
pub use sensor_source::{SensorDataCallback, SensorSource};
