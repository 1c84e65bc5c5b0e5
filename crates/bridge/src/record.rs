//! Per-vehicle runtime record

use actor_factory::SpawnedVehicle;
use contracts::{ActorId, GnssData, SensorSource};
use ingestion::VehicleContext;

/// Everything the loop knows about one vehicle
pub struct VehicleRecord<A> {
    /// Simulator actors of this vehicle
    pub vehicle: SpawnedVehicle,
    /// Frame buffer and GNSS slot fed by the sensor callbacks
    pub context: VehicleContext,
    /// Frames taken from the buffer and scored
    pub frame_count: u64,
    /// None if the agent failed to launch
    pub agent: Option<A>,
    pub(crate) sources: Vec<Box<dyn SensorSource>>,
}

impl<A> VehicleRecord<A> {
    pub(crate) fn new(
        vehicle: SpawnedVehicle,
        context: VehicleContext,
        sources: Vec<Box<dyn SensorSource>>,
    ) -> Self {
        Self {
            vehicle,
            context,
            frame_count: 0,
            agent: None,
            sources,
        }
    }

    pub fn id(&self) -> &str {
        &self.vehicle.id
    }

    pub fn actor(&self) -> ActorId {
        self.vehicle.actor
    }

    pub fn camera(&self) -> ActorId {
        self.vehicle.camera
    }

    pub fn gnss(&self) -> ActorId {
        self.vehicle.gnss
    }

    /// Last positioning reading, None until the first update
    pub fn last_gnss(&self) -> Option<GnssData> {
        self.context.gnss().latest()
    }

    pub fn has_agent(&self) -> bool {
        self.agent.is_some()
    }

    /// Listening sensor handles
    pub fn sensor_count(&self) -> usize {
        self.sources.len()
    }

    pub(crate) fn stop_sensors(&self) {
        for source in &self.sources {
            source.stop();
        }
    }
}
