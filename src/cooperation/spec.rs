//! Declarative description of a cooperation and the agents it registers.
//!
//! Grounded on the reference supervisor's `ChildSpec::new(|| Worker { id: 1 })`
//! closure-based construction: an agent is described by a factory rather than
//! a live instance, because the `restart-agent` exception reaction needs to
//! build a fresh instance of the same agent after a panic, and a `Box<dyn
//! Agent>` consumed once by `bind()` cannot be reused for that.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use super::binder::Binder;
use crate::agent::Agent;
use crate::util::{AgentId, CooperationId};

/// One agent's place in a [`CooperationSpec`]: how to build it, and which
/// dispatcher binds it (falling back to the cooperation's default binder).
#[derive(Clone)]
pub struct AgentSpec {
    pub(crate) agent_id: AgentId,
    pub(crate) factory: Arc<dyn Fn() -> Box<dyn Agent> + Send + Sync>,
    pub(crate) binder: Option<Binder>,
}

impl AgentSpec {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn Agent> + Send + Sync + 'static,
    {
        Self {
            agent_id: AgentId::new(),
            factory: Arc::new(factory),
            binder: None,
        }
    }

    /// Bind this agent through a dispatcher other than the cooperation's default.
    pub fn with_binder(mut self, binder: Binder) -> Self {
        self.binder = Some(binder);
        self
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }
}

/// A batch of agents to register atomically as one cooperation, per the
/// runtime's registration transaction: either every agent in the batch binds
/// and subscribes successfully, or none of them end up running.
#[derive(Clone)]
pub struct CooperationSpec {
    pub(crate) name: Option<String>,
    pub(crate) parent: Option<CooperationId>,
    pub(crate) default_binder: Binder,
    pub(crate) agents: Vec<AgentSpec>,
}

impl CooperationSpec {
    pub fn new(default_binder: Binder) -> Self {
        Self {
            name: None,
            parent: None,
            default_binder,
            agents: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_parent(mut self, parent: CooperationId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_agent(mut self, spec: AgentSpec) -> Self {
        self.agents.push(spec);
        self
    }
}
