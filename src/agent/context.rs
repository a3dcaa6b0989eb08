// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use super::traits::Agent;
use crate::demand::Handler;
use crate::mailbox::Mailbox;
use crate::message::{Message, MessageEnvelope, MessageType};
use crate::statechart::StateId;
use crate::timer::TimerHandle;
use crate::util::AgentId;

/// Environment-provided operations an agent needs while handling a demand or
/// running `on_start`/`on_finish`: sending messages, scheduling timers, and
/// (for state-chart agents) switching the active state.
///
/// Implemented by [`crate::environment::Environment`]; kept as a trait here so
/// `agent` does not depend on the concrete environment type, matching the
/// shape of a generic broker parameter in a classic actor-context design —
/// generalized here to an object-safe trait since one environment serves many
/// agent types at once.
pub trait EnvironmentServices: Send + Sync {
    fn send(&self, target: &Mailbox, envelope: MessageEnvelope);

    fn send_delayed(&self, target: &Mailbox, envelope: MessageEnvelope, delay: Duration) -> TimerHandle;

    fn send_periodic(
        &self,
        target: &Mailbox,
        envelope: MessageEnvelope,
        initial_delay: Duration,
        period: Duration,
    ) -> TimerHandle;

    fn mailbox_by_name(&self, name: &str) -> Option<Mailbox>;

    /// Resolve a mailbox by the id embedded in its [`crate::util::MailboxAddress`],
    /// including anonymous mailboxes that have no name — needed to route a
    /// service request's reply back to its ephemeral reply mailbox.
    fn mailbox_by_id(&self, id: u64) -> Option<Mailbox>;
}

/// Context passed to `on_start`, `on_finish`, and every subscription handler.
///
/// # Example
/// ```rust,ignore
/// fn on_order_placed(&mut self, msg: &OrderPlaced, ctx: &mut AgentContext) {
///     ctx.send(&self.confirmations, MessageEnvelope::new(OrderConfirmed { id: msg.order_id }));
/// }
/// ```
pub struct AgentContext {
    agent_id: AgentId,
    services: Arc<dyn EnvironmentServices>,
    active_state: Option<StateId>,
}

impl AgentContext {
    pub fn new(agent_id: AgentId, services: Arc<dyn EnvironmentServices>) -> Self {
        Self {
            agent_id,
            services,
            active_state: None,
        }
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Send a message to a mailbox immediately.
    pub fn send<M: Message>(&self, target: &Mailbox, message: M) {
        self.services.send(target, MessageEnvelope::new(message));
    }

    /// Send a message to a mailbox after `delay` elapses.
    pub fn send_delayed<M: Message>(&self, target: &Mailbox, message: M, delay: Duration) -> TimerHandle {
        self.services
            .send_delayed(target, MessageEnvelope::new(message), delay)
    }

    /// Send a message to a mailbox repeatedly, first after `initial_delay`
    /// and then every `period`, until the returned handle is cancelled.
    pub fn send_periodic<M: Message>(
        &self,
        target: &Mailbox,
        message: M,
        initial_delay: Duration,
        period: Duration,
    ) -> TimerHandle {
        self.services
            .send_periodic(target, MessageEnvelope::new(message), initial_delay, period)
    }

    pub fn mailbox_by_name(&self, name: &str) -> Option<Mailbox> {
        self.services.mailbox_by_name(name)
    }

    /// Reply to a service request: routes `message` to the mailbox named in
    /// `envelope`'s `reply_to` (falling back to `sender`), if any such
    /// mailbox can still be resolved. Returns whether a reply mailbox was
    /// found and the message handed off to it.
    pub fn reply<M: Message>(&self, envelope: &MessageEnvelope, message: M) -> bool {
        let Some(address) = envelope.reply_to.as_ref().or(envelope.sender.as_ref()) else {
            return false;
        };
        let Some(mailbox) = self.services.mailbox_by_id(address.id()) else {
            return false;
        };
        self.services.send(&mailbox, MessageEnvelope::new(message));
        true
    }

    /// For state-chart agents: the currently active leaf state, if any.
    pub fn active_state(&self) -> Option<StateId> {
        self.active_state
    }

    pub(crate) fn set_active_state(&mut self, state: Option<StateId>) {
        self.active_state = state;
    }
}

/// Accumulates an agent's subscriptions during `Agent::define`.
///
/// `A` is inferred at each `subscribe::<A, _>` call site from the concrete
/// type writing its own `define()` body — the context itself is not generic,
/// so one cooperation can register agents of many different concrete types
/// through the same registration loop.
pub struct DefineContext {
    agent: AgentId,
    pending: Vec<PendingSubscription>,
}

pub(crate) struct PendingSubscription {
    pub mailbox: Mailbox,
    pub message_type: MessageType,
    pub handler: Handler,
}

impl DefineContext {
    pub fn new(agent: AgentId) -> Self {
        Self {
            agent,
            pending: Vec::new(),
        }
    }

    pub fn agent_id(&self) -> AgentId {
        self.agent
    }

    /// Begin subscribing this agent to `mailbox`. Chain `.event::<M>(handler)`
    /// to pick the message type and the handler that reacts to it.
    pub fn subscribe<'a>(&'a mut self, mailbox: &Mailbox) -> Subscribing<'a> {
        Subscribing {
            ctx: self,
            mailbox: mailbox.clone(),
        }
    }

    pub(crate) fn into_pending(self) -> Vec<PendingSubscription> {
        self.pending
    }
}

/// Fluent builder returned by [`DefineContext::subscribe`].
pub struct Subscribing<'a> {
    ctx: &'a mut DefineContext,
    mailbox: Mailbox,
}

impl<'a> Subscribing<'a> {
    /// Register `handler` for messages of type `M` delivered to this mailbox.
    pub fn event<A, M, F>(self, handler: F) -> &'a mut DefineContext
    where
        A: Agent,
        M: Message,
        F: Fn(&mut A, &M, &mut AgentContext) + Send + Sync + 'static,
    {
        let boxed: Handler = Arc::new(move |agent_dyn, envelope, ctx| {
            if let Some(agent) = agent_dyn.as_any_mut_ext().downcast_mut::<A>() {
                if let Some(msg) = envelope.downcast::<M>() {
                    handler(agent, msg, ctx);
                }
            }
        });

        self.ctx.pending.push(PendingSubscription {
            mailbox: self.mailbox,
            message_type: MessageType::of::<M>(),
            handler: boxed,
        });
        self.ctx
    }
}

/// Internal extension so the boxed handler closure above can reach
/// [`super::traits::AsAnyMut`] without naming it at every call site.
trait AsAnyMutExt {
    fn as_any_mut_ext(&mut self) -> &mut dyn std::any::Any;
}

impl<T: ?Sized + super::traits::AsAnyMut> AsAnyMutExt for T {
    fn as_any_mut_ext(&mut self) -> &mut dyn std::any::Any {
        self.as_any_mut()
    }
}
