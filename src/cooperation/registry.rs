//! Environment-owned cooperation registry: name/id lookup plus the
//! recursive, depth-first deregistration walk over a cooperation's children.
//!
//! Uses `dashmap` rather than the mailbox registry's `parking_lot::RwLock<HashMap>`
//! — a cooperation registry sees far more concurrent reads relative to writes
//! (every restart and every lookup from a running agent touches it, while
//! registrations/deregistrations are comparatively rare), which is exactly
//! the access pattern lock-free sharded maps are built for.

// Layer 1: Standard library imports
use std::any::Any;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashMap;

// Layer 3: Internal module imports
use super::cooperation::Cooperation;
use super::errors::CooperationError;
use super::spec::CooperationSpec;
use crate::agent::EnvironmentServices;
use crate::dispatcher::FailureHandler;
use crate::monitoring::CooperationEvent;
use crate::util::{AgentId, CooperationId};

/// Registers, looks up, and tears down cooperations for one environment.
///
/// Also doubles as the [`FailureHandler`] every dispatcher strategy is
/// constructed with: a dispatcher instance is typically shared across many
/// cooperations (the one-thread and thread-pool strategies in particular),
/// so panics need to be demultiplexed back to the cooperation that owns the
/// failing agent rather than handled at the dispatcher itself.
pub struct CooperationRegistry {
    services: Arc<dyn EnvironmentServices>,
    diagnostics: Option<Arc<dyn Fn(CooperationEvent) + Send + Sync>>,
    shutdown_hook: Option<Arc<dyn Fn() + Send + Sync>>,
    by_id: DashMap<CooperationId, Arc<Cooperation>>,
    by_name: DashMap<String, CooperationId>,
    agent_owners: DashMap<AgentId, CooperationId>,
}

impl CooperationRegistry {
    pub fn new(services: Arc<dyn EnvironmentServices>) -> Self {
        Self {
            services,
            diagnostics: None,
            shutdown_hook: None,
            by_id: DashMap::new(),
            by_name: DashMap::new(),
            agent_owners: DashMap::new(),
        }
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn Fn(CooperationEvent) + Send + Sync>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Called when any agent's `exception_reaction` resolves to
    /// `ShutdownEnvironment` — normally wired by `Environment` to its own
    /// `stop()`.
    pub fn with_shutdown_hook(mut self, hook: Arc<dyn Fn() + Send + Sync>) -> Self {
        self.shutdown_hook = Some(hook);
        self
    }

    pub fn by_id(&self, id: CooperationId) -> Option<Arc<Cooperation>> {
        self.by_id.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<Cooperation>> {
        let id = *self.by_name.get(name)?;
        self.by_id(id)
    }

    /// Register `spec` as a new cooperation: checks the name is free, builds
    /// and runs the registration transaction, and only then makes the
    /// cooperation visible to lookups. A failed registration leaves no trace.
    pub fn register_cooperation(&self, spec: CooperationSpec) -> Result<CooperationId, CooperationError> {
        if let Some(name) = &spec.name {
            if self.by_name.contains_key(name) {
                return Err(CooperationError::DuplicateName { name: name.clone() });
            }
        }

        let id = CooperationId::new();
        let name = spec.name.clone();
        let parent = spec.parent;
        let agent_ids: Vec<AgentId> = spec.agents.iter().map(|a| a.agent_id()).collect();
        let cooperation = Cooperation::new(
            id,
            name.clone(),
            parent,
            Arc::clone(&self.services),
            self.diagnostics.clone(),
            self.shutdown_hook.clone(),
        );

        cooperation.register(spec)?;

        if let Some(parent_id) = parent {
            if let Some(parent_cooperation) = self.by_id(parent_id) {
                parent_cooperation.add_child(id);
            }
        }

        for agent_id in agent_ids {
            self.agent_owners.insert(agent_id, id);
        }
        self.by_id.insert(id, cooperation);
        if let Some(name) = name {
            self.by_name.insert(name, id);
        }

        Ok(id)
    }

    /// Tear down `id` and, depth-first, every cooperation registered as one
    /// of its children — matching the runtime's "stop children before the
    /// parent, stop grandchildren before children" ordering.
    pub fn deregister_cooperation(&self, id: CooperationId) -> Result<(), CooperationError> {
        let Some(cooperation) = self.by_id(id) else {
            return Err(CooperationError::UnknownCooperation);
        };

        for child in cooperation.children() {
            self.deregister_cooperation(child)?;
        }

        cooperation.deregister();

        self.by_id.remove(&id);
        if let Some(name) = cooperation.name() {
            self.by_name.remove(name);
        }
        self.agent_owners.retain(|_, owner| *owner != id);

        Ok(())
    }

    /// Tear down every root cooperation (and, recursively, their children),
    /// for an environment-wide shutdown. Unlike a single
    /// [`CooperationRegistry::deregister_cooperation`] call this never fails:
    /// a root that is already gone by the time its turn comes (e.g. removed
    /// by a concurrent `shutdown-environment` reaction) is simply skipped.
    pub fn deregister_all(&self) {
        let roots: Vec<CooperationId> = self
            .by_id
            .iter()
            .filter(|entry| entry.value().parent().is_none())
            .map(|entry| *entry.key())
            .collect();

        for id in roots {
            let _ = self.deregister_cooperation(id);
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl FailureHandler for CooperationRegistry {
    fn on_handler_panic(&self, agent: AgentId, payload: Box<dyn Any + Send>) {
        let Some(owner) = self.agent_owners.get(&agent).map(|entry| *entry.value()) else {
            return;
        };
        if let Some(cooperation) = self.by_id(owner) {
            cooperation.on_handler_panic(agent, payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, AgentDefineError, DefineContext};
    use crate::cooperation::{AgentSpec, Binder};
    use crate::dispatcher::{LockStyle, OneThreadDispatcher};
    use crate::mailbox::Mailbox;
    use crate::message::MessageEnvelope;
    use crate::timer::TimerHandle;
    use std::time::Duration;

    struct Noop;
    impl Agent for Noop {
        fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
            Ok(())
        }
    }

    struct NullServices;
    impl EnvironmentServices for NullServices {
        fn send(&self, _t: &Mailbox, _e: MessageEnvelope) {}
        fn send_delayed(&self, _t: &Mailbox, _e: MessageEnvelope, _d: Duration) -> TimerHandle {
            TimerHandle::inert()
        }
        fn send_periodic(&self, _t: &Mailbox, _e: MessageEnvelope, _i: Duration, _p: Duration) -> TimerHandle {
            TimerHandle::inert()
        }
        fn mailbox_by_name(&self, _n: &str) -> Option<Mailbox> {
            None
        }
        fn mailbox_by_id(&self, _id: u64) -> Option<Mailbox> {
            None
        }
    }

    fn registry() -> CooperationRegistry {
        CooperationRegistry::new(Arc::new(NullServices))
    }

    fn default_binder() -> Binder {
        Binder::new(Arc::new(OneThreadDispatcher::new(Arc::new(NullServices), LockStyle::Mutex)))
    }

    #[test]
    fn register_then_lookup_by_name_and_id() {
        let registry = registry();
        let spec = CooperationSpec::new(default_binder())
            .named("workers")
            .with_agent(AgentSpec::new(|| Box::new(Noop)));

        let id = registry.register_cooperation(spec).expect("register");
        assert!(registry.by_id(id).is_some());
        assert!(registry.by_name("workers").is_some());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let registry = registry();
        let make_spec = || CooperationSpec::new(default_binder()).named("dup").with_agent(AgentSpec::new(|| Box::new(Noop)));

        registry.register_cooperation(make_spec()).expect("first register");
        let result = registry.register_cooperation(make_spec());
        assert!(matches!(result, Err(CooperationError::DuplicateName { .. })));
    }

    #[test]
    fn deregister_removes_from_both_indices() {
        let registry = registry();
        let spec = CooperationSpec::new(default_binder()).named("scratch").with_agent(AgentSpec::new(|| Box::new(Noop)));
        let id = registry.register_cooperation(spec).expect("register");

        registry.deregister_cooperation(id).expect("deregister");
        assert!(registry.by_id(id).is_none());
        assert!(registry.by_name("scratch").is_none());
    }

    #[test]
    fn deregister_unknown_cooperation_errors() {
        let registry = registry();
        let result = registry.deregister_cooperation(CooperationId::new());
        assert!(matches!(result, Err(CooperationError::UnknownCooperation)));
    }

    #[test]
    fn deregistering_a_parent_recursively_tears_down_children() {
        let registry = registry();
        let parent_spec = CooperationSpec::new(default_binder()).named("parent").with_agent(AgentSpec::new(|| Box::new(Noop)));
        let parent_id = registry.register_cooperation(parent_spec).expect("register parent");

        let child_spec = CooperationSpec::new(default_binder())
            .named("child")
            .with_parent(parent_id)
            .with_agent(AgentSpec::new(|| Box::new(Noop)));
        registry.register_cooperation(child_spec).expect("register child");

        registry.deregister_cooperation(parent_id).expect("deregister parent");
        assert!(registry.by_name("parent").is_none());
        assert!(registry.by_name("child").is_none());
    }

    #[test]
    fn deregister_all_tears_down_every_root_and_its_children() {
        let registry = registry();
        let parent_spec = CooperationSpec::new(default_binder()).named("parent").with_agent(AgentSpec::new(|| Box::new(Noop)));
        let parent_id = registry.register_cooperation(parent_spec).expect("register parent");
        let child_spec = CooperationSpec::new(default_binder())
            .named("child")
            .with_parent(parent_id)
            .with_agent(AgentSpec::new(|| Box::new(Noop)));
        registry.register_cooperation(child_spec).expect("register child");

        let other_spec = CooperationSpec::new(default_binder()).named("other").with_agent(AgentSpec::new(|| Box::new(Noop)));
        registry.register_cooperation(other_spec).expect("register other");

        registry.deregister_all();
        assert!(registry.is_empty());
    }
}
