//! The dispatcher contract every strategy implements.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use super::errors::DispatcherError;
use crate::agent::{Agent, EnvironmentServices};
use crate::mailbox::DemandSink;
use crate::util::{AgentId, CooperationId};

/// Everything a dispatcher needs to bind one agent.
///
/// `group` and `cooperation` are only consulted by the strategies that need
/// them (`active-group` requires `group`, `thread-pool` requires
/// `cooperation`); the others ignore whichever is irrelevant to them.
pub struct BindRequest {
    pub agent_id: AgentId,
    pub agent: Box<dyn Agent>,
    pub services: Arc<dyn EnvironmentServices>,
    pub group: Option<String>,
    pub cooperation: Option<CooperationId>,
}

impl BindRequest {
    pub fn new(agent_id: AgentId, agent: Box<dyn Agent>, services: Arc<dyn EnvironmentServices>) -> Self {
        Self {
            agent_id,
            agent,
            services,
            group: None,
            cooperation: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_cooperation(mut self, cooperation: CooperationId) -> Self {
        self.cooperation = Some(cooperation);
        self
    }
}

/// A scheduling strategy owning worker threads and per-queue event storage.
///
/// Binding publishes an agent to the dispatcher and returns the
/// [`DemandSink`] its mailboxes should enqueue demands into; unbinding stops
/// new demands from being accepted for that agent (already-enqueued ones are
/// discarded once a worker observes the unbind, per §5 of the runtime's
/// concurrency model).
pub trait Dispatcher: Send + Sync {
    fn bind(&self, request: BindRequest) -> Result<Arc<dyn DemandSink>, DispatcherError>;

    fn unbind(&self, agent_id: AgentId);

    /// Stop accepting new binds, drain every queue, join every worker
    /// thread. Blocks until every already-enqueued demand has run.
    fn shutdown(&self);
}
