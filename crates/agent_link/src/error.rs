//! Agent link error types

use contracts::ContractError;
use thiserror::Error;

/// Agent link error
#[derive(Debug, Error)]
pub enum AgentError {
    /// Agent process could not be started
    #[error("failed to launch agent '{agent_id}': {message}")]
    Launch { agent_id: String, message: String },

    /// Writing to the agent failed (broken pipe, dead process)
    #[error("failed to write to agent '{agent_id}': {message}")]
    Write { agent_id: String, message: String },

    /// Agent input already closed
    #[error("agent '{agent_id}' input is closed")]
    Closed { agent_id: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl AgentError {
    /// Create launch error
    pub fn launch(agent_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Launch {
            agent_id: agent_id.into(),
            message: message.into(),
        }
    }

    /// Create write error
    pub fn write(agent_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            agent_id: agent_id.into(),
            message: message.into(),
        }
    }

    /// Create closed error
    pub fn closed(agent_id: impl Into<String>) -> Self {
        Self::Closed {
            agent_id: agent_id.into(),
        }
    }
}

impl From<AgentError> for ContractError {
    fn from(e: AgentError) -> Self {
        match e {
            AgentError::Contract(inner) => inner,
            AgentError::Write { agent_id, message } => ContractError::agent_write(agent_id, message),
            other => ContractError::Other(other.to_string()),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, AgentError>;
