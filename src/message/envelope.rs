// Layer 1: Standard library imports
// (none beyond what chrono/uuid bring in)

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc}; // §3.2 MANDATORY
use uuid::Uuid;

// Layer 3: Internal module imports
use super::any::{AnyMessage, MessageType};
use super::traits::{Message, MessagePriority};
use crate::util::ids::{MailboxAddress, MessageId};

/// Envelope carrying a type-erased message payload plus routing metadata.
///
/// Unlike a generic `MessageEnvelope<M>`, this envelope is the unit of
/// delivery that flows through a single mailbox serving many message types
/// at once: the payload is [`AnyMessage`], and the concrete type is recovered
/// only inside a subscription handler that already knows what it subscribed
/// to (see [`crate::message::any`]).
///
/// # Example
/// ```rust
/// use agentbeam::message::{Message, MessageEnvelope};
/// use agentbeam::util::MailboxAddress;
///
/// #[derive(Debug, Clone)]
/// struct MyMessage {
///     content: String,
/// }
///
/// impl Message for MyMessage {
///     const MESSAGE_TYPE: &'static str = "my_message";
/// }
///
/// let msg = MyMessage { content: "Hello".to_string() };
/// let sender = MailboxAddress::named("sender");
///
/// let envelope = MessageEnvelope::new(msg)
///     .with_sender(sender)
///     .with_ttl(60);
///
/// assert_eq!(envelope.message_type().as_str(), "my_message");
/// ```
#[derive(Debug, Clone)]
pub struct MessageEnvelope {
    pub id: MessageId,
    payload: AnyMessage,
    pub sender: Option<MailboxAddress>,
    pub reply_to: Option<MailboxAddress>,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub priority: MessagePriority,
    pub ttl: Option<u64>,
}

impl MessageEnvelope {
    pub fn new<M: Message>(payload: M) -> Self {
        let priority = payload.priority();
        Self {
            id: MessageId::new(),
            payload: AnyMessage::new(payload),
            sender: None,
            reply_to: None,
            timestamp: Utc::now(), // §3.2 chrono standard
            correlation_id: None,
            priority,
            ttl: None,
        }
    }

    pub fn with_sender(mut self, sender: MailboxAddress) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_reply_to(mut self, reply_to: MailboxAddress) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl = Some(ttl_seconds);
        self
    }

    pub fn is_expired(&self) -> bool {
        if let Some(ttl) = self.ttl {
            let age = Utc::now()
                .signed_duration_since(self.timestamp)
                .num_seconds() as u64;
            age > ttl
        } else {
            false
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.payload.message_type()
    }

    /// Recover the concrete payload, or `None` if `M` does not match the tag
    /// this envelope was constructed with.
    pub fn downcast<M: Message>(&self) -> Option<&M> {
        self.payload.downcast_ref::<M>()
    }
}
