//! The environment: the top-level object an application builds once, uses to
//! register cooperations and dispatchers, and tears down via `stop()`.
//!
//! Ties together every other module — mailboxes, timers, cooperations,
//! dispatchers — behind the single [`crate::agent::EnvironmentServices`] seam
//! agents see, matching the reference runtime's `env_t` role: the thing every
//! agent holds a reference to without knowing its concrete type.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};

// Layer 3: Internal module imports
use super::config::{DispatcherKind, EnvironmentConfig};
use super::errors::EnvironmentError;
use crate::agent::EnvironmentServices;
use crate::cooperation::{CooperationRegistry, CooperationSpec};
use crate::dispatcher::{
    ActiveGroupDispatcher, ActiveObjectDispatcher, Dispatcher, FailureHandler, OneThreadDispatcher,
    ThreadPoolDispatcher,
};
use crate::mailbox::{Mailbox, MailboxRegistry};
use crate::message::MessageEnvelope;
use crate::monitoring::MailboxEventKind;
use crate::timer::{TimerHandle, TimerService};
use crate::util::{CooperationId, MailboxAddress};

/// Proxy implementing [`EnvironmentServices`] for an [`Environment`] that
/// does not fully exist yet at the point its owned registries need an
/// `Arc<dyn EnvironmentServices>`.
///
/// Holding a `Weak` rather than the `Arc` itself is what keeps
/// `Environment -> dispatcher -> Arc<dyn EnvironmentServices> -> Environment`
/// from being a reference cycle: this handle never keeps the environment
/// alive by itself, it only resolves back to it while the environment's own
/// `Arc` is still held somewhere (by the application, ultimately).
#[derive(Clone)]
struct EnvironmentHandle(Weak<Environment>);

impl EnvironmentHandle {
    fn upgrade(&self) -> Arc<Environment> {
        self.0
            .upgrade()
            .expect("environment dropped while a handle to it was still in use")
    }
}

impl EnvironmentServices for EnvironmentHandle {
    fn send(&self, target: &Mailbox, envelope: MessageEnvelope) {
        self.upgrade().send_envelope(target, envelope);
    }

    fn send_delayed(&self, target: &Mailbox, envelope: MessageEnvelope, delay: Duration) -> TimerHandle {
        self.upgrade().send_delayed(target, envelope, delay)
    }

    fn send_periodic(
        &self,
        target: &Mailbox,
        envelope: MessageEnvelope,
        initial_delay: Duration,
        period: Duration,
    ) -> TimerHandle {
        self.upgrade().send_periodic(target, envelope, initial_delay, period)
    }

    fn mailbox_by_name(&self, name: &str) -> Option<Mailbox> {
        self.upgrade().mailbox_by_name(name)
    }

    fn mailbox_by_id(&self, id: u64) -> Option<Mailbox> {
        self.upgrade().mailbox_by_id(id)
    }
}

struct RunState {
    running: bool,
}

/// The root object of a running runtime instance.
///
/// # Example
/// ```rust
/// use agentbeam::environment::EnvironmentBuilder;
///
/// let env = EnvironmentBuilder::new().build();
/// env.stop();
/// ```
pub struct Environment {
    mailboxes: MailboxRegistry,
    timers: TimerService,
    cooperations: Arc<CooperationRegistry>,
    services: Arc<dyn EnvironmentServices>,
    named_dispatchers: DashMap<String, Arc<dyn Dispatcher>>,
    dispatchers: Mutex<Vec<Arc<dyn Dispatcher>>>,
    message_delivery_tracer: Option<Arc<dyn Fn(MailboxEventKind, &str) + Send + Sync>>,
    run_state: Mutex<RunState>,
    run_condvar: Condvar,
    stopping: AtomicBool,
}

impl Environment {
    pub fn new(config: EnvironmentConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| {
            let services: Arc<dyn EnvironmentServices> = Arc::new(EnvironmentHandle(weak_self.clone()));

            let shutdown_weak = weak_self.clone();
            let cooperations = Arc::new({
                let mut registry = CooperationRegistry::new(Arc::clone(&services))
                    .with_shutdown_hook(Arc::new(move || {
                        if let Some(env) = shutdown_weak.upgrade() {
                            env.stop();
                        }
                    }));
                if let Some(diagnostics) = config.cooperation_diagnostics.clone() {
                    registry = registry.with_diagnostics(diagnostics);
                }
                registry
            });

            let tracer = config.message_delivery_tracer.clone();
            let message_delivery_tracer: Option<Arc<dyn Fn(MailboxEventKind, &str) + Send + Sync>> =
                tracer.map(|sink| {
                    let hook: Arc<dyn Fn(MailboxEventKind, &str) + Send + Sync> =
                        Arc::new(move |event_kind, mailbox| {
                            sink(crate::monitoring::MailboxEvent {
                                timestamp: Utc::now(),
                                mailbox: mailbox.to_string(),
                                event_kind,
                                metadata: HashMap::new(),
                            });
                        });
                    hook
                });

            let env = Self {
                mailboxes: MailboxRegistry::new(),
                timers: TimerService::new(),
                cooperations,
                services,
                named_dispatchers: DashMap::new(),
                dispatchers: Mutex::new(Vec::new()),
                message_delivery_tracer,
                run_state: Mutex::new(RunState { running: false }),
                run_condvar: Condvar::new(),
                stopping: AtomicBool::new(false),
            };

            for (name, kind) in config.named_dispatchers {
                let dispatcher = env.build_dispatcher(kind);
                env.dispatchers.lock().push(Arc::clone(&dispatcher));
                env.named_dispatchers.insert(name, dispatcher);
            }

            env
        })
    }

    fn failure_handler(&self) -> Arc<dyn FailureHandler> {
        Arc::clone(&self.cooperations) as Arc<dyn FailureHandler>
    }

    fn build_dispatcher(&self, kind: DispatcherKind) -> Arc<dyn Dispatcher> {
        let on_panic = self.failure_handler();
        match kind {
            DispatcherKind::OneThread { lock_style } => {
                Arc::new(OneThreadDispatcher::with_failure_handler(Arc::clone(&self.services), lock_style, on_panic))
            }
            DispatcherKind::ActiveObject { lock_style } => {
                Arc::new(ActiveObjectDispatcher::with_failure_handler(lock_style, on_panic))
            }
            DispatcherKind::ActiveGroup { lock_style } => {
                Arc::new(ActiveGroupDispatcher::with_failure_handler(lock_style, on_panic))
            }
            DispatcherKind::ThreadPool { params } => {
                Arc::new(ThreadPoolDispatcher::with_failure_handler(params, Arc::clone(&self.services), on_panic))
            }
        }
    }

    /// Build and register a dispatcher that is reachable only through
    /// whatever [`crate::cooperation::Binder`] you construct with the
    /// returned handle — not discoverable by name.
    pub fn create_disp(&self, kind: DispatcherKind) -> Arc<dyn Dispatcher> {
        let dispatcher = self.build_dispatcher(kind);
        self.dispatchers.lock().push(Arc::clone(&dispatcher));
        dispatcher
    }

    /// Build, register, and name a dispatcher so it can later be looked up
    /// with [`Environment::named_dispatcher`].
    pub fn create_private_disp(&self, kind: DispatcherKind, name: impl Into<String>) -> Arc<dyn Dispatcher> {
        let dispatcher = self.build_dispatcher(kind);
        self.dispatchers.lock().push(Arc::clone(&dispatcher));
        self.named_dispatchers.insert(name.into(), Arc::clone(&dispatcher));
        dispatcher
    }

    /// Register an already-built dispatcher under `name`, e.g. one shared
    /// across environments in a test harness.
    pub fn add_named_dispatcher(&self, name: impl Into<String>, dispatcher: Arc<dyn Dispatcher>) {
        self.dispatchers.lock().push(Arc::clone(&dispatcher));
        self.named_dispatchers.insert(name.into(), dispatcher);
    }

    pub fn named_dispatcher(&self, name: &str) -> Option<Arc<dyn Dispatcher>> {
        self.named_dispatchers.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Create and register a named mailbox, reachable afterward via
    /// [`Environment::mailbox_by_name`]. Fails with
    /// [`EnvironmentError::DuplicateMailboxName`] if `name` is already taken.
    pub fn create_mbox(&self, name: impl Into<String>) -> Result<Mailbox, EnvironmentError> {
        let name = name.into();
        let mailbox = Mailbox::new(MailboxAddress::named(name.clone()));
        if !self.mailboxes.insert(mailbox.clone()) {
            return Err(EnvironmentError::DuplicateMailboxName { name });
        }
        Ok(mailbox)
    }

    /// Create and register an anonymous mailbox, reachable only via the
    /// returned handle or [`Environment::mailbox_by_id`].
    pub fn create_anonymous_mbox(&self) -> Mailbox {
        let mailbox = Mailbox::new(MailboxAddress::anonymous());
        // Anonymous addresses are uuid-based and never collide on name.
        let _ = self.mailboxes.insert(mailbox.clone());
        mailbox
    }

    /// Create and register a named direct mailbox (single-subscriber-per-type).
    /// Fails with [`EnvironmentError::DuplicateMailboxName`] if `name` is
    /// already taken.
    pub fn create_direct_mbox(&self, name: impl Into<String>) -> Result<Mailbox, EnvironmentError> {
        let name = name.into();
        let mailbox = Mailbox::direct(MailboxAddress::named(name.clone()));
        if !self.mailboxes.insert(mailbox.clone()) {
            return Err(EnvironmentError::DuplicateMailboxName { name });
        }
        Ok(mailbox)
    }

    pub fn mailbox_by_name(&self, name: &str) -> Option<Mailbox> {
        self.mailboxes.by_name(name)
    }

    pub fn mailbox_by_id(&self, id: u64) -> Option<Mailbox> {
        self.mailboxes.by_id(id)
    }

    /// Send `request` to `target` and block the calling thread for up to
    /// `timeout` waiting for a reply of type `Rep`, via the mailbox module's
    /// synchronous request/reply rendezvous.
    pub fn request<Req, Rep>(
        &self,
        target: &Mailbox,
        request: Req,
        timeout: Duration,
    ) -> Result<Rep, crate::mailbox::MailboxError>
    where
        Req: crate::message::Message,
        Rep: crate::message::Message + Clone,
    {
        crate::mailbox::request(target, &self.mailboxes, request, timeout)
    }

    /// Register a cooperation, binding every agent in `spec` atomically.
    pub fn register_cooperation(&self, spec: CooperationSpec) -> Result<CooperationId, EnvironmentError> {
        self.cooperations.register_cooperation(spec).map_err(EnvironmentError::from)
    }

    /// Deregister a cooperation and, depth-first, every child it owns.
    pub fn deregister_cooperation(&self, id: CooperationId) -> Result<(), EnvironmentError> {
        self.cooperations.deregister_cooperation(id).map_err(EnvironmentError::from)
    }

    pub fn cooperation_by_name(&self, name: &str) -> Option<Arc<crate::cooperation::Cooperation>> {
        self.cooperations.by_name(name)
    }

    /// Send `message` to `target` immediately, via whatever subscribers are
    /// currently registered for its type.
    pub fn send<M: crate::message::Message>(&self, target: &Mailbox, message: M) {
        self.send_envelope(target, MessageEnvelope::new(message));
    }

    fn send_envelope(&self, target: &Mailbox, envelope: MessageEnvelope) {
        let message_type = envelope.message_type();
        let subscriber_count = target.deliver(envelope);
        if let Some(tracer) = &self.message_delivery_tracer {
            let address = target.address().to_string();
            tracer(
                MailboxEventKind::Delivered { message_type: message_type.as_str().to_string(), subscriber_count },
                &address,
            );
        }
    }

    fn send_delayed(&self, target: &Mailbox, envelope: MessageEnvelope, delay: Duration) -> TimerHandle {
        let services = Arc::clone(&self.services);
        let target = target.clone();
        self.timers.schedule_once(delay, move || {
            services.send(&target, envelope.clone());
        })
    }

    fn send_periodic(
        &self,
        target: &Mailbox,
        envelope: MessageEnvelope,
        initial_delay: Duration,
        period: Duration,
    ) -> TimerHandle {
        let services = Arc::clone(&self.services);
        let target = target.clone();
        self.timers.schedule_periodic(initial_delay, period, move || {
            services.send(&target, envelope.clone());
        })
    }

    /// Block the calling thread until [`Environment::stop`] is called (by
    /// this thread or another, including from inside a panicking agent's
    /// `shutdown-environment` reaction), after first running `bootstrap` to
    /// register the application's cooperations and dispatchers.
    pub fn start(self: &Arc<Self>, bootstrap: impl FnOnce(&Arc<Environment>)) {
        {
            let mut state = self.run_state.lock();
            state.running = true;
        }

        bootstrap(self);

        let mut state = self.run_state.lock();
        while state.running {
            self.run_condvar.wait(&mut state);
        }
    }

    /// Stop the environment: tear down every root cooperation (depth-first,
    /// children before parents), shut down every dispatcher and the timer
    /// service, and unblock any thread parked in [`Environment::start`].
    ///
    /// Idempotent — a second call is a no-op.
    pub fn stop(&self) {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return;
        }

        self.cooperations.deregister_all();

        for dispatcher in self.dispatchers.lock().drain(..) {
            dispatcher.shutdown();
        }
        self.timers.shutdown();

        let mut state = self.run_state.lock();
        state.running = false;
        self.run_condvar.notify_all();
    }
}
