//! Simulator client abstraction
//!
//! The single injected connection handle. Supports the real CARLA client and
//! the in-process mock behind one interface.

use std::collections::HashMap;
use std::future::Future;

use contracts::{ActorId, SensorSource, SensorType, Transform, WorldSettings};

use crate::error::Result;

/// Simulator client trait
///
/// Lifecycle: `connect` → `configure_world` → (`tick` …) → `teardown`.
pub trait SimulatorClient: Send + Sync {
    /// Connect to the simulator server
    fn connect(&mut self, host: &str, port: u16) -> impl Future<Output = Result<()>> + Send;

    /// Apply world settings
    ///
    /// # Returns
    /// The settings that were active before, restored by `teardown`
    fn configure_world(
        &self,
        settings: WorldSettings,
    ) -> impl Future<Output = Result<WorldSettings>> + Send;

    /// Advance the world by exactly one fixed step
    ///
    /// # Returns
    /// Simulation frame number after the step
    fn tick(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Spawn locations offered by the current map
    fn spawn_points(&self) -> impl Future<Output = Result<Vec<Transform>>> + Send;

    /// Spawn vehicle with autopilot enabled
    ///
    /// # Arguments
    /// * `blueprint` - Blueprint name, e.g., "vehicle.tesla.model3"
    /// * `transform` - Spawn location
    fn spawn_vehicle(
        &self,
        blueprint: &str,
        transform: Transform,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Spawn sensor and attach to parent actor
    ///
    /// # Arguments
    /// * `blueprint` - Blueprint name, e.g., "sensor.camera.rgb"
    /// * `transform` - Pose relative to parent actor
    /// * `parent_id` - Parent actor ID
    /// * `attributes` - Blueprint attributes
    fn spawn_sensor(
        &self,
        blueprint: &str,
        transform: Transform,
        parent_id: ActorId,
        attributes: &HashMap<String, String>,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Current world transform of an actor
    fn actor_transform(&self, actor_id: ActorId) -> impl Future<Output = Result<Transform>> + Send;

    /// Destroy actor
    ///
    /// Idempotent operation: returns Ok if actor doesn't exist
    fn destroy_actor(&self, actor_id: ActorId) -> impl Future<Output = Result<()>> + Send;

    /// Check if actor exists
    fn actor_exists(&self, actor_id: ActorId) -> impl Future<Output = Result<bool>> + Send;

    /// Get sensor data source
    ///
    /// # Returns
    /// Boxed `SensorSource`, None if the actor is not a known sensor
    fn get_sensor_source(
        &self,
        actor_id: ActorId,
        sensor_id: String,
        sensor_type: SensorType,
    ) -> Option<Box<dyn SensorSource>>;

    /// Restore the settings replaced by `configure_world`
    fn teardown(&self) -> impl Future<Output = Result<()>> + Send;
}
