//! The mailbox: a dynamic, multi-message-type subscription table that routes
//! an incoming envelope to every agent subscribed to its message type.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::RwLock;

// Layer 3: Internal module imports
use super::errors::MailboxError;
use crate::demand::{Demand, Handler};
use crate::message::{MessageEnvelope, MessageType};
use crate::util::{AgentId, MailboxAddress};

/// Whatever a subscription ultimately delivers its matched [`Demand`] into —
/// a dispatcher's queue in the common case, or (for the service-request
/// rendezvous) an inline handler invoked synchronously on the calling thread.
pub trait DemandSink: Send + Sync {
    fn enqueue(&self, demand: Demand);
}

/// Whether a mailbox allows many independent subscribers per message type
/// (`Local`, the common pub/sub case) or restricts each message type to
/// exactly one bound subscriber (`Direct`, a private inbox owned by one agent).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxKind {
    Local,
    Direct,
}

struct Subscriber {
    agent: AgentId,
    handler: Handler,
    sink: Arc<dyn DemandSink>,
}

struct MailboxInner {
    address: MailboxAddress,
    kind: MailboxKind,
    subscriptions: RwLock<HashMap<MessageType, Vec<Subscriber>>>,
}

/// A cheaply-cloneable handle to a mailbox's subscription table.
///
/// Grounded on the SObjectizer `local_mbox` concept of a subscription table
/// keyed by message type, generalized here with an `Arc<dyn Any + Send +
/// Sync>`-erased payload (see [`crate::message::any`]) so one mailbox table
/// can hold subscribers for arbitrarily many message types at once.
#[derive(Clone)]
pub struct Mailbox {
    inner: Arc<MailboxInner>,
}

impl Mailbox {
    pub fn new(address: MailboxAddress) -> Self {
        Self::with_kind(address, MailboxKind::Local)
    }

    pub fn direct(address: MailboxAddress) -> Self {
        Self::with_kind(address, MailboxKind::Direct)
    }

    fn with_kind(address: MailboxAddress, kind: MailboxKind) -> Self {
        Self {
            inner: Arc::new(MailboxInner {
                address,
                kind,
                subscriptions: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn address(&self) -> &MailboxAddress {
        &self.inner.address
    }

    pub fn kind(&self) -> MailboxKind {
        self.inner.kind
    }

    /// Register `agent`'s `handler` for `message_type`, routing matched
    /// demands through `sink`. Re-subscribing the same `(message_type,
    /// agent)` pair replaces the prior entry rather than adding a second one.
    /// On a `Direct` mailbox, a subscriber for the same message type but a
    /// different agent is rejected.
    pub(crate) fn subscribe(
        &self,
        message_type: MessageType,
        agent: AgentId,
        handler: Handler,
        sink: Arc<dyn DemandSink>,
    ) -> Result<(), MailboxError> {
        let mut subscriptions = self.inner.subscriptions.write();
        let subscribers = subscriptions.entry(message_type).or_default();

        if self.inner.kind == MailboxKind::Direct && subscribers.iter().any(|s| s.agent != agent) {
            return Err(MailboxError::AlreadyBound);
        }

        subscribers.retain(|s| s.agent != agent);
        subscribers.push(Subscriber { agent, handler, sink });
        Ok(())
    }

    /// Remove every subscription belonging to `agent`, across all message
    /// types. Used during agent deregistration.
    pub(crate) fn unsubscribe_agent(&self, agent: AgentId) {
        let mut subscriptions = self.inner.subscriptions.write();
        for subscribers in subscriptions.values_mut() {
            subscribers.retain(|s| s.agent != agent);
        }
        subscriptions.retain(|_, subscribers| !subscribers.is_empty());
    }

    /// Number of subscribers currently registered for `message_type`.
    pub fn subscriber_count(&self, message_type: MessageType) -> usize {
        self.inner
            .subscriptions
            .read()
            .get(&message_type)
            .map_or(0, Vec::len)
    }

    /// Route `envelope` to every subscriber registered for its message type,
    /// enqueueing one [`Demand`] per match. Returns the number of matches.
    pub fn deliver(&self, envelope: MessageEnvelope) -> usize {
        let message_type = envelope.message_type();
        let subscribers = self.inner.subscriptions.read();
        let Some(subscribers) = subscribers.get(&message_type) else {
            return 0;
        };

        let envelope = Arc::new(envelope);
        for subscriber in subscribers {
            let demand = Demand::new(Arc::clone(&envelope), subscriber.agent, Arc::clone(&subscriber.handler));
            subscriber.sink.enqueue(demand);
        }
        subscribers.len()
    }
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox")
            .field("address", &self.inner.address)
            .field("kind", &self.inner.kind)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Mailbox {
    fn eq(&self, other: &Self) -> bool {
        self.inner.address == other.inner.address
    }
}
