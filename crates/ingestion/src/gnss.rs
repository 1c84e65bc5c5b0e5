//! Latest-reading GNSS cache

use std::sync::{Arc, Mutex};

use contracts::GnssData;

/// Single-slot, last-write-wins GNSS cell
///
/// No history is kept. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct GnssSlot {
    inner: Arc<Mutex<Option<GnssData>>>,
}

impl GnssSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the cached reading
    pub fn store(&self, reading: GnssData) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = Some(reading);
    }

    /// Most recent reading, None until the first update
    pub fn latest(&self) -> Option<GnssData> {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(latitude: f64) -> GnssData {
        GnssData {
            latitude,
            longitude: 8.0,
            altitude: 100.0,
        }
    }

    #[test]
    fn test_empty_until_first_store() {
        assert!(GnssSlot::new().latest().is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let slot = GnssSlot::new();
        let writer = slot.clone();
        writer.store(reading(1.0));
        writer.store(reading(2.0));
        assert_eq!(slot.latest(), Some(reading(2.0)));
    }
}
