//! Agent launch description

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Environment variable carrying the vehicle identity
pub const AGENT_ID_ENV: &str = "AGENT_ID";

/// Environment variable telling the agent it is fed by the simulator
pub const CARLA_MODE_ENV: &str = "CARLA_MODE";

/// How to start an agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    /// Executable
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory, None = inherit
    pub working_dir: Option<PathBuf>,
    /// Time granted between closing stdin and killing the process
    pub grace_period: Duration,
}

impl Default for AgentSpec {
    fn default() -> Self {
        Self {
            program: "cargo".to_string(),
            args: vec!["run".to_string(), "--release".to_string()],
            working_dir: None,
            grace_period: Duration::from_secs(5),
        }
    }
}

impl AgentSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            ..Default::default()
        }
    }

    /// Command for the agent of `agent_id`, all three stdio streams piped
    ///
    /// The inherited environment is kept; identity and mode are added.
    pub fn command(&self, agent_id: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env(AGENT_ID_ENV, agent_id)
            .env(CARLA_MODE_ENV, "true")
            .env("RUST_BACKTRACE", "1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        command
    }
}
