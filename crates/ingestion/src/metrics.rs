//! Ingestion counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Ingestion metrics
///
/// Shared by every vehicle context; updated from sensor delivery threads.
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Camera frames received
    pub frames_received: AtomicU64,

    /// Frames dropped because the buffer was full
    pub frames_dropped: AtomicU64,

    /// Payloads that could not be decoded
    pub decode_errors: AtomicU64,

    /// GNSS readings cached
    pub gnss_updates: AtomicU64,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_gnss_update(&self) {
        self.gnss_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            gnss_updates: self.gnss_updates.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub frames_dropped: u64,
    pub decode_errors: u64,
    pub gnss_updates: u64,
}
