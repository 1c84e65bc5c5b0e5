//! # Bridge
//!
//! Simulation loop tying the simulator, the per-vehicle ingestion contexts,
//! the detection pipeline and the agents together.
//!
//! Lifecycle (strictly forward):
//! `Idle` → `FleetReady` → `AgentsRunning` → `Ticking` → `Cleanup`
//!
//! ```ignore
//! let mut client = MockSimulatorClient::new();
//! bridge::connect(&mut client, "localhost", 2000).await?;
//!
//! let mut bridge = Bridge::new(client, ProcessLauncher::default(), detection::load_pipeline(None));
//! bridge.spawn_fleet(&FleetSpec::new(3)).await?;
//! bridge.start_agents().await?;
//! let stats = bridge.run(Duration::from_secs(60), shutdown_signal()).await?;
//! ```

mod bridge;
mod error;
mod record;
mod state;
mod stats;

pub use bridge::{connect, Bridge, PROGRESS_INTERVAL};
pub use error::{BridgeError, Result};
pub use record::VehicleRecord;
pub use state::BridgeState;
pub use stats::RunStats;
