//! Ingestion error types

use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Camera payload could not be decoded
    #[error("failed to decode frame from '{sensor_id}': {message}")]
    DecodeFailed {
        /// Sensor ID
        sensor_id: String,
        /// Error message
        message: String,
    },
}

impl IngestionError {
    /// Create decode error
    pub fn decode(sensor_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DecodeFailed {
            sensor_id: sensor_id.into(),
            message: message.into(),
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
