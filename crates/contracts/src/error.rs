//! Layered error definitions
//!
//! Categorized by source: carla / payload / detection / agent

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== CARLA Errors =====
    /// CARLA connection error
    #[error("carla connection error: {message}")]
    CarlaConnection { message: String },

    /// CARLA spawn error
    #[error("carla spawn error for '{actor_id}': {message}")]
    CarlaSpawn { actor_id: String, message: String },

    /// CARLA actor not found
    #[error("carla actor not found: {actor_id}")]
    CarlaActorNotFound { actor_id: String },

    // ===== Payload Errors =====
    /// Data parse error
    #[error("payload parse error for sensor '{sensor_id}': {message}")]
    PayloadParse { sensor_id: String, message: String },

    // ===== Detection Errors =====
    /// Inference failed inside the detection model
    #[error("inference error in model '{model}': {message}")]
    Inference { model: String, message: String },

    // ===== Agent Errors =====
    /// Agent channel write error
    #[error("agent '{agent_id}' write error: {message}")]
    AgentWrite { agent_id: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create CARLA spawn error
    pub fn carla_spawn(actor_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CarlaSpawn {
            actor_id: actor_id.into(),
            message: message.into(),
        }
    }

    /// Create payload parse error
    pub fn payload_parse(sensor_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PayloadParse {
            sensor_id: sensor_id.into(),
            message: message.into(),
        }
    }

    /// Create inference error
    pub fn inference(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Inference {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Create agent write error
    pub fn agent_write(agent_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AgentWrite {
            agent_id: agent_id.into(),
            message: message.into(),
        }
    }
}
