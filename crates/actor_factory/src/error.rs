//! Actor Factory error types

use contracts::ContractError;
use thiserror::Error;

/// Actor Factory specific error
#[derive(Debug, Error)]
pub enum ActorFactoryError {
    /// CARLA connection error
    #[error("failed to connect to CARLA: {message}")]
    ConnectionFailed { message: String },

    /// World settings could not be applied
    #[error("failed to apply world settings: {message}")]
    SettingsFailed { message: String },

    /// World tick error
    #[error("world tick failed: {message}")]
    TickFailed { message: String },

    /// Vehicle spawn error
    #[error("failed to spawn vehicle '{vehicle_id}': {message}")]
    VehicleSpawnFailed { vehicle_id: String, message: String },

    /// Sensor spawn error
    #[error("failed to spawn sensor '{sensor_id}' on vehicle '{vehicle_id}': {message}")]
    SensorSpawnFailed {
        sensor_id: String,
        vehicle_id: String,
        message: String,
    },

    /// Unknown actor
    #[error("actor {actor_id} not found")]
    ActorNotFound { actor_id: u32 },

    /// Destroy error
    #[error("failed to destroy actor {actor_id}: {message}")]
    DestroyFailed { actor_id: u32, message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl ActorFactoryError {
    /// Create connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
        }
    }

    /// Create vehicle spawn error
    pub fn vehicle_spawn(vehicle_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VehicleSpawnFailed {
            vehicle_id: vehicle_id.into(),
            message: message.into(),
        }
    }

    /// Create sensor spawn error
    pub fn sensor_spawn(
        sensor_id: impl Into<String>,
        vehicle_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SensorSpawnFailed {
            sensor_id: sensor_id.into(),
            vehicle_id: vehicle_id.into(),
            message: message.into(),
        }
    }

    /// True for failures that make the simulator unusable
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::SettingsFailed { .. }
        )
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, ActorFactoryError>;
