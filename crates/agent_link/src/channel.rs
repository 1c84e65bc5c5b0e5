//! Agent capability traits

use std::future::Future;
use std::time::Duration;

use contracts::OutboundMessage;

use crate::error::Result;

/// Connection to one running agent
///
/// Implement [`AgentChannel`] (the `Send` variant); this local variant exists
/// for single-threaded callers.
#[trait_variant::make(AgentChannel: Send)]
pub trait LocalAgentChannel {
    /// Agent identity (the owning vehicle's id)
    fn agent_id(&self) -> &str;

    /// Forward one message as a single line, flushed immediately
    ///
    /// # Errors
    /// The message is lost; callers log and continue.
    async fn send(&mut self, message: &OutboundMessage) -> Result<()>;

    /// Stop the agent
    ///
    /// Closes its input, waits up to `grace`, then forces termination.
    /// Never fails; problems are logged.
    async fn shutdown(&mut self, grace: Duration);
}

/// Starts one agent per vehicle
pub trait AgentLauncher: Send + Sync {
    type Agent: AgentChannel + 'static;

    /// Launch the agent for `vehicle_id`
    fn launch(&self, vehicle_id: &str) -> impl Future<Output = Result<Self::Agent>> + Send;

    /// Grace period granted at shutdown
    fn grace_period(&self) -> Duration;
}
