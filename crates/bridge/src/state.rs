//! Bridge lifecycle state

use crate::error::{BridgeError, Result};

/// Bridge lifecycle state
///
/// Transitions are strictly forward. `Cleanup` is terminal and can be entered
/// from any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BridgeState {
    /// Constructed, no vehicles
    Idle,
    /// Vehicles spawned
    FleetReady,
    /// Agents launched
    AgentsRunning,
    /// Steady-state loop
    Ticking,
    /// Terminal
    Cleanup,
}

impl BridgeState {
    /// The state normally following this one
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::FleetReady),
            Self::FleetReady => Some(Self::AgentsRunning),
            Self::AgentsRunning => Some(Self::Ticking),
            Self::Ticking => Some(Self::Cleanup),
            Self::Cleanup => None,
        }
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        self.successor() == Some(next) || (next == Self::Cleanup && self != Self::Cleanup)
    }

    /// Validated transition
    pub fn transition(&mut self, next: Self) -> Result<()> {
        if !self.can_transition_to(next) {
            return Err(BridgeError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}
