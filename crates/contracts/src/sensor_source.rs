//! SensorSource trait - Sensor data source abstraction
//!
//! Decouples the ingestor from concrete sensor implementations so real CARLA
//! sensors and mock sensors are handled the same way.

use std::sync::Arc;

use crate::{SensorPacket, SensorType};

/// Sensor data callback type
///
/// Invoked on the sensor delivery thread once per measurement.
pub type SensorDataCallback = Arc<dyn Fn(SensorPacket) + Send + Sync>;

/// Sensor data source trait
///
/// Abstracts the common behavior of real CARLA sensors and mock sensors.
///
/// # Example
///
/// ```ignore
/// let sensor: Box<dyn SensorSource> = client.get_sensor_source(actor_id, id, SensorType::Gnss)?;
/// sensor.listen(context.callback());
/// // ... run ...
/// sensor.stop();
/// ```
pub trait SensorSource: Send + Sync {
    /// Get sensor ID
    fn sensor_id(&self) -> &str;

    /// Get sensor type
    fn sensor_type(&self) -> SensorType;

    /// Register data callback
    ///
    /// Repeated calls while already listening are ignored.
    fn listen(&self, callback: SensorDataCallback);

    /// Stop listening
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
