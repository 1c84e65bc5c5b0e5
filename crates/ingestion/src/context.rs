//! Per-vehicle ingestion context
//!
//! One shared `ingest` function handles every sensor of every vehicle; the
//! vehicle-specific state travels in an explicit `VehicleContext`.

use std::sync::Arc;

use contracts::{SensorDataCallback, SensorPacket, SensorPayload};
use metrics::counter;
use tracing::{trace, warn};

use crate::buffer::FrameBuffer;
use crate::decode::decode_image;
use crate::gnss::GnssSlot;
use crate::metrics::IngestionMetrics;

/// State shared between one vehicle's sensor callbacks and the main loop
#[derive(Debug, Clone)]
pub struct VehicleContext {
    vehicle_id: Arc<str>,
    frames: FrameBuffer,
    gnss: GnssSlot,
    metrics: Arc<IngestionMetrics>,
}

impl VehicleContext {
    /// Create context with an empty frame buffer and GNSS slot
    pub fn new(vehicle_id: impl Into<Arc<str>>, metrics: Arc<IngestionMetrics>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            frames: FrameBuffer::new(),
            gnss: GnssSlot::new(),
            metrics,
        }
    }

    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn frames(&self) -> &FrameBuffer {
        &self.frames
    }

    pub fn gnss(&self) -> &GnssSlot {
        &self.gnss
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    /// Callback for `SensorSource::listen`, routing into [`ingest`]
    pub fn callback(&self) -> SensorDataCallback {
        let context = self.clone();
        Arc::new(move |packet| ingest(&context, packet))
    }
}

/// Handle one sensor packet for the vehicle owning `context`
///
/// Runs on the simulator's delivery thread and never blocks: camera frames are
/// decoded and offered to the frame buffer (dropped when full), GNSS readings
/// overwrite the cached one.
pub fn ingest(context: &VehicleContext, packet: SensorPacket) {
    match packet.payload {
        SensorPayload::Image(image) => {
            context.metrics.record_frame_received();

            let frame = match decode_image(&packet.sensor_id, &image) {
                Ok(frame) => frame,
                Err(e) => {
                    context.metrics.record_decode_error();
                    warn!(vehicle_id = %context.vehicle_id, error = %e, "dropping undecodable frame");
                    return;
                }
            };

            if !context.frames.try_push(frame) {
                context.metrics.record_frame_dropped();
                counter!(
                    "carla_bridge_frames_dropped_total",
                    "vehicle_id" => context.vehicle_id.to_string()
                )
                .increment(1);
                trace!(vehicle_id = %context.vehicle_id, frame_id = ?packet.frame_id, "frame buffer full, frame dropped");
            }
        }
        SensorPayload::Gnss(reading) => {
            context.gnss.store(reading);
            context.metrics.record_gnss_update();
        }
    }
}
