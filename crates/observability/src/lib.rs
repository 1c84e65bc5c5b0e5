//! # Observability
//!
//! Tracing subscriber setup and Prometheus metrics for the bridge.
//!
//! ## Features
//!
//! - Tracing initialisation (JSON / pretty / compact)
//! - Prometheus exporter
//! - Metric recording helpers (`carla_bridge_*`)
//!
//! ## Usage Example
//!
//! ```ignore
//! observability::init_with_config(ObservabilityConfig {
//!     log_format: LogFormat::Compact,
//!     metrics_port: Some(9000),
//!     ..Default::default()
//! })?;
//!
//! observability::record_progress(elapsed_secs, ticks, frames, fps);
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::metrics::{
    record_detections, record_frame_processed, record_message_forwarded, record_progress,
    record_tick, RunningStats, StatsSummary,
};

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log format
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Level used when `RUST_LOG` is unset
    pub default_log_level: String,
    /// Use `default_log_level` even if `RUST_LOG` is set
    pub ignore_env: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_port: None,
            default_log_level: "info".to_string(),
            ignore_env: false,
        }
    }
}

impl ObservabilityConfig {
    /// Map `-v` count / `-q` flag to a level
    pub fn with_verbosity(mut self, verbose: u8, quiet: bool) -> Self {
        if quiet {
            self.default_log_level = "warn".to_string();
            self.ignore_env = true;
        } else {
            self.default_log_level = match verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
            .to_string();
            self.ignore_env = verbose > 0;
        }
        self
    }

    fn filter(&self) -> EnvFilter {
        if self.ignore_env {
            return EnvFilter::new(&self.default_log_level);
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_log_level))
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs
    Json,
    /// Human-readable multi-line
    #[default]
    Pretty,
    /// Single line
    Compact,
}

/// Initialise tracing, and the Prometheus exporter if a port is set
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        level = %config.default_log_level,
        metrics_port = ?config.metrics_port,
        "observability initialized"
    );

    Ok(())
}

/// Initialise only the Prometheus exporter on `0.0.0.0:port`
///
/// For callers that set up tracing themselves.
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.default_log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_verbosity_mapping() {
        let quiet = ObservabilityConfig::default().with_verbosity(2, true);
        assert_eq!(quiet.default_log_level, "warn");
        assert!(quiet.ignore_env);

        let debug = ObservabilityConfig::default().with_verbosity(1, false);
        assert_eq!(debug.default_log_level, "debug");

        let default = ObservabilityConfig::default().with_verbosity(0, false);
        assert_eq!(default.default_log_level, "info");
        assert!(!default.ignore_env);
    }
}
