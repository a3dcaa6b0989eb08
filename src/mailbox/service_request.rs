//! Synchronous request/reply rendezvous on top of the otherwise asynchronous
//! mailbox delivery path.
//!
//! A request is routed through the normal `Mailbox::deliver` -> `DemandSink`
//! path, exactly like a one-way message, so the handler that answers it runs
//! on whatever dispatcher owns the target agent. The calling thread just
//! blocks on a channel until the reply arrives (or the timeout elapses).
//! Grounded on SObjectizer's synchronous service-request layer, simplified
//! from its full nested-dispatch pump down to a dedicated ephemeral reply
//! mailbox plus a blocking channel.

// Layer 1: Standard library imports
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use super::errors::MailboxError;
use super::mailbox::{DemandSink, Mailbox};
use super::registry::MailboxRegistry;
use crate::agent::context::EnvironmentServices;
use crate::agent::{Agent, AgentContext, AgentDefineError, DefineContext};
use crate::demand::Demand;
use crate::message::{Message, MessageEnvelope, MessageType};
use crate::util::{AgentId, MailboxAddress};

/// A `DemandSink` that executes a matched demand synchronously, on whatever
/// thread calls `enqueue`, instead of queueing it for a dispatcher worker.
///
/// Used only for a service request's ephemeral reply mailbox: the reply
/// handler does nothing but forward the payload to a channel, so there is no
/// need (and no agent state) to protect with a dispatcher-owned queue.
struct InlineSink;

impl DemandSink for InlineSink {
    fn enqueue(&self, demand: Demand) {
        let mut collector = ReplyCollectorAgent;
        let mut ctx = AgentContext::new(demand.agent, Arc::new(NoServices));
        demand.execute(&mut collector, &mut ctx);
    }
}

/// Placeholder agent identity for the reply mailbox's single subscription.
/// Its handler closure never touches `self`; it only exists to satisfy
/// `Demand::execute`'s `&mut dyn Agent` parameter.
struct ReplyCollectorAgent;

impl Agent for ReplyCollectorAgent {
    fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
        Ok(())
    }
}

/// A reply handler never calls back into the environment, so this stub
/// panics if asked to do anything beyond what `InlineSink` requires of it.
struct NoServices;

impl EnvironmentServices for NoServices {
    fn send(&self, _target: &Mailbox, _envelope: MessageEnvelope) {}
    fn send_delayed(&self, _t: &Mailbox, _e: MessageEnvelope, _d: Duration) -> crate::timer::TimerHandle {
        crate::timer::TimerHandle::inert()
    }
    fn send_periodic(
        &self,
        _t: &Mailbox,
        _e: MessageEnvelope,
        _i: Duration,
        _p: Duration,
    ) -> crate::timer::TimerHandle {
        crate::timer::TimerHandle::inert()
    }
    fn mailbox_by_name(&self, _name: &str) -> Option<Mailbox> {
        None
    }
    fn mailbox_by_id(&self, _id: u64) -> Option<Mailbox> {
        None
    }
}

/// Send `request` to `target` and block for up to `timeout` for a single
/// reply of type `Rep`.
///
/// `registry` must be the environment's mailbox registry: the ephemeral
/// reply mailbox is registered there for the duration of the call so a
/// handler's [`AgentContext::reply`](crate::agent::AgentContext::reply) can
/// resolve it by the id carried in the request envelope's `reply_to`, even
/// though the mailbox was never given a name.
///
/// Fails fast with [`MailboxError::NoHandler`] or
/// [`MailboxError::MultipleHandlers`] if `target`'s subscriber count for
/// `Req` is not exactly one, without ever sending the request — matching the
/// fire-and-forget path's ambiguity rules instead of silently picking a
/// winner.
pub fn request<Req, Rep>(
    target: &Mailbox,
    registry: &MailboxRegistry,
    request: Req,
    timeout: Duration,
) -> Result<Rep, MailboxError>
where
    Req: Message,
    Rep: Message + Clone,
{
    let subscriber_count = target.subscriber_count(MessageType::of::<Req>());
    match subscriber_count {
        0 => return Err(MailboxError::NoHandler),
        1 => {}
        count => return Err(MailboxError::MultipleHandlers { count }),
    }

    let reply_mailbox = Mailbox::direct(MailboxAddress::anonymous());
    let reply_address = reply_mailbox.address().clone();
    registry.insert(reply_mailbox.clone());

    let (tx, rx) = mpsc::channel::<Rep>();
    let handler: crate::demand::Handler = Arc::new(move |_agent, envelope, _ctx| {
        if let Some(reply) = envelope.downcast::<Rep>() {
            let _ = tx.send(reply.clone());
        }
    });

    reply_mailbox
        .subscribe(MessageType::of::<Rep>(), AgentId::new(), handler, Arc::new(InlineSink))
        .expect("freshly created direct mailbox has no prior subscriber");

    let envelope = MessageEnvelope::new(request).with_reply_to(reply_address.clone());
    target.deliver(envelope);

    let outcome = rx.recv_timeout(timeout).map_err(|_| MailboxError::Timeout);
    registry.remove(&reply_address);
    outcome
}
