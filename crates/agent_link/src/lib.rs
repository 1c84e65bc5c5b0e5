//! # Agent Link
//!
//! One external decision agent per vehicle.
//!
//! Responsibilities:
//! - Launch agent subprocesses with their identity in the environment
//! - Frame `OutboundMessage`s as JSON lines on the agent's stdin
//! - Drain agent stdout/stderr into the log
//! - Shut agents down: close stdin, wait a grace period, then kill
//!
//! `AgentLauncher`/`AgentChannel` are the capability seams; `MemoryLauncher`
//! stands in for real processes in tests.

mod channel;
mod codec;
mod error;
mod memory;
mod process;
mod spec;

pub use channel::{AgentChannel, AgentLauncher, LocalAgentChannel};
pub use codec::JsonLineWriter;
pub use error::{AgentError, Result};
pub use memory::{AgentTranscript, MemoryAgent, MemoryLauncher};
pub use process::{AgentProcess, ProcessLauncher};
pub use spec::{AgentSpec, AGENT_ID_ENV, CARLA_MODE_ENV};
