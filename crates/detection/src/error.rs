//! Detection error types

use contracts::ContractError;
use thiserror::Error;

/// Detection error
#[derive(Debug, Error)]
pub enum DetectionError {
    /// Model file could not be loaded
    #[error("failed to load model '{path}': {message}")]
    ModelLoad { path: String, message: String },

    /// Model output has an unexpected layout
    #[error("unexpected model output: {message}")]
    OutputShape { message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl DetectionError {
    /// Create model load error
    pub fn model_load(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create output shape error
    pub fn output_shape(message: impl Into<String>) -> Self {
        Self::OutputShape {
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, DetectionError>;
