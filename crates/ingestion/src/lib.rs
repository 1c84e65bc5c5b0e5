//! # Ingestion
//!
//! Sensor ingestor: the boundary between simulator delivery threads and the
//! bridge's main loop.
//!
//! Responsibilities:
//! - Decode raw camera payloads into RGB pixel arrays
//! - Queue frames per vehicle in a bounded, never-blocking `FrameBuffer`
//! - Cache the latest GNSS reading per vehicle in a `GnssSlot`
//! - Count received, dropped and undecodable data
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionMetrics, VehicleContext};
//!
//! let context = VehicleContext::new("carla_vehicle_0", Arc::new(IngestionMetrics::new()));
//! camera.listen(context.callback());
//! gnss.listen(context.callback());
//!
//! // main loop
//! if let (Some(reading), Some(frame)) = (context.gnss().latest(), context.frames().try_pop()) {
//!     // detect and forward
//! }
//! ```

mod buffer;
mod context;
mod decode;
mod error;
mod gnss;
mod metrics;

pub use buffer::{FrameBuffer, FRAME_BUFFER_CAPACITY};
pub use context::{ingest, VehicleContext};
pub use decode::decode_image;
pub use error::{IngestionError, Result};
pub use gnss::GnssSlot;
pub use crate::metrics::{IngestionMetrics, MetricsSnapshot};
