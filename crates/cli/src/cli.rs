//! CLI argument definitions using clap.

use std::path::PathBuf;
use std::time::Duration;

use agent_link::AgentSpec;
use clap::{Parser, Subcommand, ValueEnum};

use crate::error::{CliError, Result};

/// CARLA Bridge - feeds simulated camera detections to per-vehicle agents
#[derive(Parser, Debug)]
#[command(
    name = "carla-bridge",
    author,
    version,
    about = "Bridge between the CARLA simulator and per-vehicle decision agents",
    long_about = "Connects to CARLA in synchronous mode, spawns a fleet of autopilot \n\
                  vehicles with a camera and a GNSS each, runs object detection on the \n\
                  camera frames and forwards every detection as one JSON line to the \n\
                  vehicle's agent process."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CARLA_BRIDGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CARLA_BRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Spawn the fleet and run the bridge
    Run(RunArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// CARLA server host
    #[arg(long, default_value = "localhost", env = "CARLA_HOST")]
    pub host: String,

    /// CARLA server port
    #[arg(long, default_value = "2000", env = "CARLA_PORT")]
    pub port: u16,

    /// Number of vehicles to spawn
    #[arg(long, default_value = "3", env = "CARLA_BRIDGE_VEHICLES")]
    pub vehicles: usize,

    /// Run duration in seconds
    #[arg(long, default_value = "60", env = "CARLA_BRIDGE_DURATION")]
    pub duration: u64,

    /// Vehicle blueprint
    #[arg(long, default_value = "vehicle.tesla.model3", env = "CARLA_BRIDGE_VEHICLE_BLUEPRINT")]
    pub vehicle_blueprint: String,

    /// YOLO ONNX model (detection disabled if unset)
    #[arg(long, env = "CARLA_BRIDGE_MODEL")]
    pub model: Option<PathBuf>,

    /// Agent executable
    #[arg(long, default_value = "cargo", env = "CARLA_BRIDGE_AGENT_PROGRAM")]
    pub agent_program: String,

    /// Agent argument (repeatable)
    #[arg(
        long = "agent-arg",
        value_name = "ARG",
        default_values_t = ["run".to_string(), "--release".to_string()],
        allow_hyphen_values = true
    )]
    pub agent_args: Vec<String>,

    /// Agent working directory
    #[arg(long, env = "CARLA_BRIDGE_AGENT_DIR")]
    pub agent_dir: Option<PathBuf>,

    /// Seconds an agent gets to exit after its input is closed
    #[arg(long, default_value = "5", env = "CARLA_BRIDGE_AGENT_GRACE_SECS")]
    pub agent_grace_secs: u64,

    /// CARLA RPC timeout in seconds
    #[cfg_attr(not(feature = "real-carla"), allow(dead_code))]
    #[arg(long, default_value = "10", env = "CARLA_BRIDGE_CLIENT_TIMEOUT_SECS")]
    pub client_timeout_secs: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "CARLA_BRIDGE_METRICS_PORT")]
    pub metrics_port: u16,

    /// Use the in-process simulator instead of a CARLA server
    #[arg(long, env = "CARLA_BRIDGE_MOCK")]
    pub mock: bool,
}

impl RunArgs {
    /// Reject values the bridge cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.vehicles == 0 {
            return Err(CliError::invalid_argument("vehicles", "must be at least 1"));
        }
        if self.agent_program.trim().is_empty() {
            return Err(CliError::invalid_argument("agent-program", "must not be empty"));
        }
        if let Some(dir) = &self.agent_dir {
            if !dir.is_dir() {
                return Err(CliError::invalid_argument(
                    "agent-dir",
                    format!("{} is not a directory", dir.display()),
                ));
            }
        }
        Ok(())
    }

    pub fn run_duration(&self) -> Duration {
        Duration::from_secs(self.duration)
    }

    pub fn metrics_port(&self) -> Option<u16> {
        (self.metrics_port != 0).then_some(self.metrics_port)
    }

    /// Launch description for the agents
    pub fn agent_spec(&self) -> AgentSpec {
        AgentSpec {
            working_dir: self.agent_dir.clone(),
            grace_period: Duration::from_secs(self.agent_grace_secs),
            ..AgentSpec::new(&self.agent_program, self.agent_args.clone())
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(["carla-bridge", "run"].iter().chain(args)).unwrap();
        match cli.command {
            Commands::Run(args) => args,
        }
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.port, 2000);
        assert_eq!(args.vehicles, 3);
        assert_eq!(args.run_duration(), Duration::from_secs(60));
        assert_eq!(args.agent_args, vec!["run", "--release"]);
        assert_eq!(args.metrics_port(), None);
        assert!(args.model.is_none());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_agent_spec_from_args() {
        let args = parse(&[
            "--agent-program",
            "python3",
            "--agent-arg",
            "agent.py",
            "--agent-arg",
            "--fast",
            "--agent-grace-secs",
            "2",
        ]);
        let spec = args.agent_spec();

        assert_eq!(spec.program, "python3");
        assert_eq!(spec.args, vec!["agent.py", "--fast"]);
        assert_eq!(spec.grace_period, Duration::from_secs(2));
        assert_eq!(spec.working_dir, None);
    }

    #[test]
    fn test_agent_dir_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let args = parse(&["--agent-dir", dir.path().to_str().unwrap()]);
        assert!(args.validate().is_ok());
        assert_eq!(args.agent_spec().working_dir.as_deref(), Some(dir.path()));

        let missing = dir.path().join("missing");
        let args = parse(&["--agent-dir", missing.to_str().unwrap()]);
        assert!(matches!(
            args.validate(),
            Err(CliError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_zero_vehicles_rejected() {
        let args = parse(&["--vehicles", "0"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["carla-bridge", "-v", "-q", "run"]).is_err());
    }
}
