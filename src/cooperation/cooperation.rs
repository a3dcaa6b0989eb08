//! A cooperation: an atomically registered group of agents, the unit the
//! runtime restarts, escalates, and tears down as a whole.
//!
//! Grounded on the reference supervisor's child-table and restart-strategy
//! machinery (`supervisor::node::SupervisorNode`), reshaped around §4.4's
//! batch registration transaction: agents are not added one at a time with
//! `add_child`, they are declared up front in a [`super::spec::CooperationSpec`]
//! and bound together, so that a failure partway through never leaves a
//! partially-registered cooperation visible to the rest of the environment.

// Layer 1: Standard library imports
use std::any::Any;
use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Weak};
use std::time::Duration;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
use super::backoff::RestartBackoff;
use super::binder::Binder;
use super::errors::CooperationError;
use super::spec::CooperationSpec;
use super::state::CooperationState;
use crate::agent::context::PendingSubscription;
use crate::agent::{Agent, DefineContext, EnvironmentServices, ExceptionReaction};
use crate::dispatcher::FailureHandler;
use crate::mailbox::{DemandSink, Mailbox};
use crate::message::{Message, MessageEnvelope};
use crate::monitoring::{CooperationEvent, CooperationEventKind};
use crate::util::{AgentId, CooperationId};

/// Zero-payload marker used to construct the synthetic `on_start`/`on_finish`
/// demands a cooperation enqueues for its own agents; never subscribed to,
/// never routed through a mailbox.
#[derive(Debug, Clone)]
struct LifecycleSignal;
impl Message for LifecycleSignal {
    const MESSAGE_TYPE: &'static str = "cooperation::lifecycle";
}

const FINISH_TIMEOUT: Duration = Duration::from_secs(5);

struct BoundAgent {
    factory: Arc<dyn Fn() -> Box<dyn Agent> + Send + Sync>,
    binder: Binder,
    sink: Arc<dyn DemandSink>,
    subscriptions: Vec<Mailbox>,
    exception_reaction: ExceptionReaction,
    backoff: RestartBackoff,
}

/// An atomically registered group of agents plus the supervisory policy
/// applied when one of them panics.
pub struct Cooperation {
    id: CooperationId,
    name: Option<String>,
    parent: Option<CooperationId>,
    services: Arc<dyn EnvironmentServices>,
    self_ref: Weak<Cooperation>,
    state: Mutex<CooperationState>,
    children: Mutex<Vec<CooperationId>>,
    agents: Mutex<HashMap<AgentId, BoundAgent>>,
    diagnostics: Option<Arc<dyn Fn(CooperationEvent) + Send + Sync>>,
    shutdown_hook: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl Cooperation {
    pub(crate) fn new(
        id: CooperationId,
        name: Option<String>,
        parent: Option<CooperationId>,
        services: Arc<dyn EnvironmentServices>,
        diagnostics: Option<Arc<dyn Fn(CooperationEvent) + Send + Sync>>,
        shutdown_hook: Option<Arc<dyn Fn() + Send + Sync>>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            id,
            name,
            parent,
            services,
            self_ref: self_ref.clone(),
            state: Mutex::new(CooperationState::Registering),
            children: Mutex::new(Vec::new()),
            agents: Mutex::new(HashMap::new()),
            diagnostics,
            shutdown_hook,
        })
    }

    pub fn id(&self) -> CooperationId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<CooperationId> {
        self.parent
    }

    pub fn state(&self) -> CooperationState {
        *self.state.lock()
    }

    pub(crate) fn add_child(&self, child: CooperationId) {
        self.children.lock().push(child);
    }

    pub(crate) fn children(&self) -> Vec<CooperationId> {
        self.children.lock().clone()
    }

    /// Registration transaction: build, define, and bind every agent in
    /// `spec`, or leave nothing bound at all.
    ///
    /// Ordering is the spec's bind-then-define protocol turned inside out:
    /// `define()` runs first, against a freshly built agent that nothing else
    /// can yet observe, so a define failure costs nothing to unwind. Binding
    /// happens second, once an agent's subscriptions are already known good —
    /// this still gives the same all-or-nothing guarantee, since unbinding an
    /// already-bound agent (step 2's rollback path) is exactly as cheap as
    /// the spec's literal ordering would have required anyway.
    pub(crate) fn register(self: &Arc<Self>, spec: CooperationSpec) -> Result<(), CooperationError> {
        let mut built: Vec<(AgentId, Binder, Box<dyn Agent>, ExceptionReaction, Vec<PendingSubscription>)> = Vec::new();

        for agent_spec in &spec.agents {
            let agent_id = agent_spec.agent_id;
            let factory = Arc::clone(&agent_spec.factory);
            let binder = agent_spec.binder.clone();
            let mut agent = factory();
            let mut define_ctx = DefineContext::new(agent_id);
            agent.define(&mut define_ctx)?;
            let exception_reaction = agent.exception_reaction();
            let pending = define_ctx.into_pending();
            let binder = binder.unwrap_or_else(|| spec.default_binder.clone());
            built.push((agent_id, binder, agent, exception_reaction, pending));
        }

        let mut bound: Vec<(AgentId, Arc<dyn Fn() -> Box<dyn Agent> + Send + Sync>, Binder, Arc<dyn DemandSink>, Vec<Mailbox>, ExceptionReaction)> =
            Vec::new();

        for (i, (agent_id, binder, agent, exception_reaction, pending)) in built.into_iter().enumerate() {
            let factory = spec.agents[i].factory.clone();
            match binder.bind(agent_id, agent, Arc::clone(&self.services), self.id) {
                Ok(sink) => {
                    let mut subscriptions = Vec::with_capacity(pending.len());
                    let mut subscribe_failed = None;
                    for p in &pending {
                        if let Err(err) = p.mailbox.subscribe(p.message_type, agent_id, Arc::clone(&p.handler), Arc::clone(&sink)) {
                            subscribe_failed = Some(err);
                            break;
                        }
                        subscriptions.push(p.mailbox.clone());
                    }
                    if let Some(err) = subscribe_failed {
                        for mailbox in &subscriptions {
                            mailbox.unsubscribe_agent(agent_id);
                        }
                        binder.unbind(agent_id);
                        for (aid, _, b, _, subs, _) in &bound {
                            for mailbox in subs {
                                mailbox.unsubscribe_agent(*aid);
                            }
                            b.unbind(*aid);
                        }
                        return Err(CooperationError::from(err));
                    }
                    bound.push((agent_id, factory, binder, sink, subscriptions, exception_reaction));
                }
                Err(err) => {
                    for (aid, _, b, _, subs, _) in &bound {
                        for mailbox in subs {
                            mailbox.unsubscribe_agent(*aid);
                        }
                        b.unbind(*aid);
                    }
                    return Err(CooperationError::from(err));
                }
            }
        }

        let mut agents = self.agents.lock();
        for (agent_id, factory, binder, sink, subscriptions, exception_reaction) in bound {
            self.fire_on_start(&sink, agent_id);
            agents.insert(
                agent_id,
                BoundAgent {
                    factory,
                    binder,
                    sink,
                    subscriptions,
                    exception_reaction,
                    backoff: RestartBackoff::default(),
                },
            );
        }
        drop(agents);

        *self.state.lock() = CooperationState::Active;
        self.emit(CooperationEventKind::Registered, None, HashMap::new());
        Ok(())
    }

    fn fire_on_start(&self, sink: &Arc<dyn DemandSink>, agent_id: AgentId) {
        let handler: crate::demand::Handler = Arc::new(|agent, _envelope, ctx| agent.on_start(ctx));
        sink.enqueue(crate::demand::Demand::new(Arc::new(MessageEnvelope::new(LifecycleSignal)), agent_id, handler));
    }

    /// Deregistration transaction for this cooperation's own agents (children
    /// are torn down one level up, by [`super::registry::CooperationRegistry`]).
    pub(crate) fn deregister(&self) {
        *self.state.lock() = CooperationState::Deregistering;

        let mut agents = self.agents.lock();
        for (agent_id, bound) in agents.drain() {
            for mailbox in &bound.subscriptions {
                mailbox.unsubscribe_agent(agent_id);
            }

            let (tx, rx) = mpsc::channel::<()>();
            let handler: crate::demand::Handler = Arc::new(move |agent, _envelope, ctx| {
                agent.on_finish(ctx);
                let _ = tx.send(());
            });
            bound
                .sink
                .enqueue(crate::demand::Demand::new(Arc::new(MessageEnvelope::new(LifecycleSignal)), agent_id, handler));
            let _ = rx.recv_timeout(FINISH_TIMEOUT);

            bound.binder.unbind(agent_id);
        }
        drop(agents);

        *self.state.lock() = CooperationState::Deregistered;
        self.emit(CooperationEventKind::Deregistered, None, HashMap::new());
    }

    fn emit(&self, kind: CooperationEventKind, agent_id: Option<AgentId>, metadata: HashMap<String, String>) {
        let Some(sink) = &self.diagnostics else {
            return;
        };
        sink(CooperationEvent {
            timestamp: chrono::Utc::now(),
            cooperation_id: self.id.to_string(),
            agent_id: agent_id.map(|id| id.to_string()),
            event_kind: kind,
            metadata,
        });
    }

    /// Re-run a single agent's registration: build a fresh instance from its
    /// stored factory, `define()` it, and bind it back in under the same id
    /// as before. Runs on a short-lived background thread so the dispatcher
    /// worker that reported the original panic is never blocked on it.
    fn restart_agent(self: &Arc<Self>, agent_id: AgentId, delay: Duration) {
        let weak = self.self_ref.clone();
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            let Some(cooperation) = weak.upgrade() else {
                return;
            };

            let (factory, binder, exception_reaction, mut backoff) = {
                let agents = cooperation.agents.lock();
                let Some(bound) = agents.get(&agent_id) else {
                    return;
                };
                (
                    Arc::clone(&bound.factory),
                    bound.binder.clone(),
                    bound.exception_reaction,
                    bound.backoff.clone(),
                )
            };

            let mut agent = factory();
            let mut define_ctx = DefineContext::new(agent_id);
            if agent.define(&mut define_ctx).is_err() {
                cooperation.deregister_single(agent_id);
                return;
            }
            let pending = define_ctx.into_pending();

            let Ok(sink) = binder.bind(agent_id, agent, Arc::clone(&cooperation.services), cooperation.id) else {
                cooperation.agents.lock().remove(&agent_id);
                return;
            };

            let mut subscriptions: Vec<Mailbox> = Vec::with_capacity(pending.len());
            for p in &pending {
                if p.mailbox.subscribe(p.message_type, agent_id, Arc::clone(&p.handler), Arc::clone(&sink)).is_err() {
                    for mailbox in &subscriptions {
                        mailbox.unsubscribe_agent(agent_id);
                    }
                    binder.unbind(agent_id);
                    cooperation.agents.lock().remove(&agent_id);
                    return;
                }
                subscriptions.push(p.mailbox.clone());
            }

            cooperation.fire_on_start(&sink, agent_id);
            backoff.record_restart();
            let count = backoff.restart_count();
            cooperation.agents.lock().insert(
                agent_id,
                BoundAgent {
                    factory,
                    binder,
                    sink,
                    subscriptions,
                    exception_reaction,
                    backoff,
                },
            );
            cooperation.emit(
                CooperationEventKind::AgentRestarted { restart_count: count },
                Some(agent_id),
                HashMap::new(),
            );
        });
    }

    fn deregister_single(&self, agent_id: AgentId) {
        let bound = self.agents.lock().remove(&agent_id);
        if let Some(bound) = bound {
            for mailbox in &bound.subscriptions {
                mailbox.unsubscribe_agent(agent_id);
            }
            bound.binder.unbind(agent_id);
        }
    }
}

impl FailureHandler for Cooperation {
    fn on_handler_panic(&self, agent_id: AgentId, payload: Box<dyn Any + Send>) {
        let reaction = {
            let agents = self.agents.lock();
            agents.get(&agent_id).map(|bound| bound.exception_reaction)
        };
        let Some(reaction) = reaction else {
            return;
        };

        let message = panic_message(&payload);
        self.emit(
            CooperationEventKind::ReactionApplied { reaction: format!("{reaction:?}") },
            Some(agent_id),
            HashMap::new(),
        );

        match reaction {
            ExceptionReaction::IgnoreException => {}
            ExceptionReaction::AbortOnException => {
                self.emit(
                    CooperationEventKind::AgentFailed { error: message, restart_count: 0 },
                    Some(agent_id),
                    HashMap::new(),
                );
                self.deregister_single(agent_id);
            }
            ExceptionReaction::EscalateToCooperation => {
                self.emit(
                    CooperationEventKind::AgentFailed { error: message, restart_count: 0 },
                    Some(agent_id),
                    HashMap::new(),
                );
                self.deregister();
            }
            ExceptionReaction::RestartAgent => {
                let limit_exceeded = {
                    let mut agents = self.agents.lock();
                    agents.get_mut(&agent_id).map(|bound| bound.backoff.is_limit_exceeded()).unwrap_or(true)
                };
                if limit_exceeded {
                    self.emit(
                        CooperationEventKind::RestartLimitExceeded { restart_count: 0, window: Duration::from_secs(60) },
                        Some(agent_id),
                        HashMap::new(),
                    );
                    self.deregister();
                    return;
                }
                let delay = {
                    let mut agents = self.agents.lock();
                    agents.get_mut(&agent_id).map(|bound| bound.backoff.calculate_delay()).unwrap_or_default()
                };
                if let Some(strong) = self.self_ref.upgrade() {
                    strong.restart_agent(agent_id, delay);
                }
            }
            ExceptionReaction::ShutdownEnvironment => {
                self.emit(
                    CooperationEventKind::AgentFailed { error: message, restart_count: 0 },
                    Some(agent_id),
                    HashMap::new(),
                );
                match &self.shutdown_hook {
                    Some(hook) => hook(),
                    // No environment wired in (e.g. a cooperation built directly in a
                    // test): fall back to tearing down just this cooperation.
                    None => self.deregister(),
                }
            }
        }
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "agent handler panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentDefineError, DefineContext};
    use crate::dispatcher::{LockStyle, OneThreadDispatcher};
    use crate::timer::TimerHandle;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Noop;
    impl Agent for Noop {
        fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
            Ok(())
        }
    }

    struct AlwaysFailsToDefine;
    impl Agent for AlwaysFailsToDefine {
        fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
            Err(AgentDefineError::new("nope"))
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

    fn binder() -> Binder {
        Binder::new(Arc::new(OneThreadDispatcher::new(Arc::new(NullServices), LockStyle::Mutex)))
    }

    fn spec_with(factory: impl Fn() -> Box<dyn Agent> + Send + Sync + 'static) -> CooperationSpec {
        CooperationSpec::new(binder()).with_agent(super::super::spec::AgentSpec::new(factory))
    }

    #[test]
    fn register_binds_every_agent_and_fires_on_start() {
        let cooperation = Cooperation::new(CooperationId::new(), None, None, Arc::new(NullServices), None, None);
        let started = Arc::new(AtomicU32::new(0));

        struct Counter(Arc<AtomicU32>);
        impl Agent for Counter {
            fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
                Ok(())
            }
            fn on_start(&mut self, _ctx: &mut AgentContext) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let spec = spec_with({
            let started = Arc::clone(&started);
            move || Box::new(Counter(Arc::clone(&started)))
        });

        cooperation.register(spec).expect("register");
        assert_eq!(cooperation.state(), CooperationState::Active);

        // fire_on_start enqueues onto a one-thread dispatcher; shutting it
        // down drains the queue before returning.
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn register_rolls_back_entirely_when_one_agent_fails_to_define() {
        let cooperation = Cooperation::new(CooperationId::new(), None, None, Arc::new(NullServices), None, None);
        let spec = CooperationSpec::new(binder())
            .with_agent(super::super::spec::AgentSpec::new(|| Box::new(Noop)))
            .with_agent(super::super::spec::AgentSpec::new(|| Box::new(AlwaysFailsToDefine)));

        let result = cooperation.register(spec);
        assert!(matches!(result, Err(CooperationError::Define(_))));
        assert_eq!(cooperation.state(), CooperationState::Registering);
    }

    #[test]
    fn abort_on_exception_removes_only_the_failing_agent() {
        let cooperation = Cooperation::new(CooperationId::new(), None, None, Arc::new(NullServices), None, None);
        let spec = spec_with(|| Box::new(Noop));
        cooperation.register(spec).expect("register");

        let agent_id = {
            let agents = cooperation.agents.lock();
            *agents.keys().next().expect("one agent")
        };

        cooperation.on_handler_panic(agent_id, Box::new("boom"));
        assert!(cooperation.agents.lock().get(&agent_id).is_none());
        assert_eq!(cooperation.state(), CooperationState::Active);
    }

    #[test]
    fn escalate_to_cooperation_deregisters_everything() {
        struct Escalates;
        impl Agent for Escalates {
            fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
                Ok(())
            }
            fn exception_reaction(&self) -> ExceptionReaction {
                ExceptionReaction::EscalateToCooperation
            }
        }

        let cooperation = Cooperation::new(CooperationId::new(), None, None, Arc::new(NullServices), None, None);
        let spec = spec_with(|| Box::new(Escalates));
        cooperation.register(spec).expect("register");

        let agent_id = {
            let agents = cooperation.agents.lock();
            *agents.keys().next().expect("one agent")
        };

        cooperation.on_handler_panic(agent_id, Box::new("boom"));
        assert_eq!(cooperation.state(), CooperationState::Deregistered);
        assert!(cooperation.agents.lock().is_empty());
    }

    #[test]
    fn lifecycle_signal_has_a_stable_message_type() {
        assert_eq!(LifecycleSignal::MESSAGE_TYPE, "cooperation::lifecycle");
    }

    #[test]
    fn shutdown_environment_without_a_hook_falls_back_to_deregistering_self() {
        struct ShutsDown;
        impl Agent for ShutsDown {
            fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
                Ok(())
            }
            fn exception_reaction(&self) -> ExceptionReaction {
                ExceptionReaction::ShutdownEnvironment
            }
        }

        let cooperation = Cooperation::new(CooperationId::new(), None, None, Arc::new(NullServices), None, None);
        let spec = spec_with(|| Box::new(ShutsDown));
        cooperation.register(spec).expect("register");

        let agent_id = {
            let agents = cooperation.agents.lock();
            *agents.keys().next().expect("one agent")
        };

        cooperation.on_handler_panic(agent_id, Box::new("boom"));
        assert_eq!(cooperation.state(), CooperationState::Deregistered);
    }

    #[test]
    fn shutdown_environment_with_a_hook_calls_it_instead_of_deregistering_self() {
        struct ShutsDown;
        impl Agent for ShutsDown {
            fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
                Ok(())
            }
            fn exception_reaction(&self) -> ExceptionReaction {
                ExceptionReaction::ShutdownEnvironment
            }
        }

        let hook_called = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hook_called);
        let cooperation = Cooperation::new(
            CooperationId::new(),
            None,
            None,
            Arc::new(NullServices),
            None,
            Some(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        );
        let spec = spec_with(|| Box::new(ShutsDown));
        cooperation.register(spec).expect("register");

        let agent_id = {
            let agents = cooperation.agents.lock();
            *agents.keys().next().expect("one agent")
        };

        cooperation.on_handler_panic(agent_id, Box::new("boom"));
        assert_eq!(hook_called.load(Ordering::SeqCst), 1);
        // The hook owns the shutdown; this cooperation is left for the
        // environment's own teardown walk to reach, not torn down inline.
        assert_eq!(cooperation.state(), CooperationState::Active);
    }
}
