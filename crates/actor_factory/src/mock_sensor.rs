//! Mock sensor implementation
//!
//! Implements `SensorSource` for the mock simulator. Unlike a free-running
//! sensor thread, data is delivered by `MockSimulatorClient::tick`, so every
//! tick produces exactly one measurement per listening sensor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use contracts::{SensorDataCallback, SensorPacket, SensorSource, SensorType};
use tracing::{debug, trace};

/// Callback slot shared between a mock sensor and the mock world
#[derive(Default)]
pub(crate) struct SensorSlot {
    listening: AtomicBool,
    callback: Mutex<Option<SensorDataCallback>>,
}

impl SensorSlot {
    /// Callback to deliver to, if listening
    pub(crate) fn active_callback(&self) -> Option<SensorDataCallback> {
        if !self.listening.load(Ordering::Relaxed) {
            return None;
        }
        self.callback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub(crate) fn deliver(&self, packet: SensorPacket) {
        if let Some(callback) = self.active_callback() {
            callback(packet);
        }
    }

    pub(crate) fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        self.callback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
    }
}

/// Mock sensor
///
/// Handle onto a sensor actor of the mock world.
pub struct MockSensor {
    sensor_id: String,
    sensor_type: SensorType,
    slot: Arc<SensorSlot>,
}

impl MockSensor {
    pub(crate) fn new(sensor_id: String, sensor_type: SensorType, slot: Arc<SensorSlot>) -> Self {
        Self {
            sensor_id,
            sensor_type,
            slot,
        }
    }
}

impl SensorSource for MockSensor {
    fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    fn listen(&self, callback: SensorDataCallback) {
        // Idempotent: if already listening, don't register again
        if self.slot.listening.swap(true, Ordering::SeqCst) {
            trace!(sensor_id = %self.sensor_id, "mock sensor already listening");
            return;
        }
        *self
            .slot
            .callback
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(callback);
        debug!(sensor_id = %self.sensor_id, sensor_type = ?self.sensor_type, "mock sensor listening");
    }

    fn stop(&self) {
        if self.slot.listening.load(Ordering::SeqCst) {
            debug!(sensor_id = %self.sensor_id, "mock sensor stopped");
        }
        self.slot.stop();
    }

    fn is_listening(&self) -> bool {
        self.slot.listening.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GnssData, SensorPayload};
    use std::sync::atomic::AtomicU64;

    fn gnss_packet() -> SensorPacket {
        SensorPacket {
            sensor_id: "gnss".to_string(),
            sensor_type: SensorType::Gnss,
            timestamp: 0.0,
            frame_id: Some(1),
            payload: SensorPayload::Gnss(GnssData {
                latitude: 0.0,
                longitude: 0.0,
                altitude: 0.0,
            }),
        }
    }

    #[test]
    fn test_mock_sensor_idempotent_listen() {
        let slot = Arc::new(SensorSlot::default());
        let sensor = MockSensor::new("gnss".to_string(), SensorType::Gnss, slot.clone());

        let count = Arc::new(AtomicU64::new(0));
        let count1 = count.clone();
        let count2 = count.clone();

        sensor.listen(Arc::new(move |_| {
            count1.fetch_add(1, Ordering::Relaxed);
        }));
        // Second call should be ignored
        sensor.listen(Arc::new(move |_| {
            count2.fetch_add(100, Ordering::Relaxed);
        }));

        slot.deliver(gnss_packet());
        slot.deliver(gnss_packet());

        assert_eq!(count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_mock_sensor_stop_silences_delivery() {
        let slot = Arc::new(SensorSlot::default());
        let sensor = MockSensor::new("gnss".to_string(), SensorType::Gnss, slot.clone());
        let count = Arc::new(AtomicU64::new(0));
        let count_clone = count.clone();

        sensor.listen(Arc::new(move |_| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        }));
        sensor.stop();
        slot.deliver(gnss_packet());

        assert_eq!(count.load(Ordering::Relaxed), 0);
        assert!(!sensor.is_listening());
    }
}
