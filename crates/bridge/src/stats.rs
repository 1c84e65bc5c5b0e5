//! Run statistics

use std::time::Duration;

use observability::RunningStats;

/// Statistics from one bridge run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Ticks attempted
    pub ticks: u64,
    /// Ticks the simulator rejected
    pub tick_failures: u64,
    /// Frames scored, all vehicles
    pub frames_processed: u64,
    /// Messages written to agents
    pub messages_forwarded: u64,
    /// Messages lost (no agent, broken pipe)
    pub forward_failures: u64,
    /// Stopped by an external interrupt rather than the time budget
    pub interrupted: bool,
    /// Wall time spent ticking
    pub duration: Duration,
    /// Per-tick processing time (ms)
    pub step_ms: RunningStats,
}

impl RunStats {
    /// Average frames per second over the whole run
    pub fn fps(&self) -> f64 {
        fps(self.frames_processed, self.duration)
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Bridge Run Statistics ===\n");
        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Ticks: {} ({} failed)", self.ticks, self.tick_failures);
        println!("   ├─ Frames processed: {}", self.frames_processed);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   └─ Stopped by: {}", if self.interrupted { "interrupt" } else { "time budget" });

        println!("\nAgents");
        println!("   ├─ Messages forwarded: {}", self.messages_forwarded);
        println!("   └─ Messages lost: {}", self.forward_failures);

        println!("\nStep time (ms)");
        println!("   └─ {}", self.step_ms.summary());

        println!();
    }
}

pub(crate) fn fps(frames: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        frames as f64 / secs
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps() {
        let stats = RunStats {
            frames_processed: 60,
            duration: Duration::from_secs(2),
            ..Default::default()
        };
        assert_eq!(stats.fps(), 30.0);
        assert_eq!(RunStats::default().fps(), 0.0);
    }
}
