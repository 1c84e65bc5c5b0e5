//! Bridge error types

use actor_factory::ActorFactoryError;
use thiserror::Error;

use crate::state::BridgeState;

/// Bridge error
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Lifecycle step called out of order
    #[error("invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: BridgeState, to: BridgeState },

    /// Simulator failure that prevents the bridge from running
    #[error(transparent)]
    Simulator(#[from] ActorFactoryError),
}

/// Result alias
pub type Result<T> = std::result::Result<T, BridgeError>;
