//! Bridge metrics
//!
//! Thin helpers over the `metrics` facade; without an installed recorder
//! they are no-ops.

use metrics::{counter, gauge, histogram};

/// Record one world tick and how long its processing took
pub fn record_tick(step_ms: f64, ok: bool) {
    let status = if ok { "ok" } else { "failed" };
    counter!("carla_bridge_ticks_total", "status" => status).increment(1);
    histogram!("carla_bridge_step_duration_ms").record(step_ms);
}

/// Record one frame taken from a vehicle's buffer and scored
pub fn record_frame_processed(vehicle_id: &str) {
    counter!(
        "carla_bridge_frames_processed_total",
        "vehicle_id" => vehicle_id.to_string()
    )
    .increment(1);
}

/// Record detections kept for one frame
pub fn record_detections(count: usize) {
    histogram!("carla_bridge_detections_per_frame").record(count as f64);
}

/// Record one outbound message
pub fn record_message_forwarded(vehicle_id: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "carla_bridge_messages_total",
        "vehicle_id" => vehicle_id.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Publish the periodic progress figures
pub fn record_progress(elapsed_secs: f64, ticks: u64, frames: u64, fps: f64) {
    gauge!("carla_bridge_elapsed_seconds").set(elapsed_secs);
    gauge!("carla_bridge_ticks").set(ticks as f64);
    gauge!("carla_bridge_frames").set(frames as f64);
    gauge!("carla_bridge_fps").set(fps);
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}

/// Printable snapshot of a [`RunningStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatsSummary {
    pub count: u64,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
            min: stats.min(),
            max: stats.max(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return write!(f, "n/a");
        }
        write!(
            f,
            "mean={:.2} std={:.2} min={:.2} max={:.2} (n={})",
            self.mean, self.std_dev, self.min, self.max, self.count
        )
    }
}
