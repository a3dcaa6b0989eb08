// Layer 1: Standard library imports
use std::any::Any;
use std::fmt;
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use super::traits::Message;

/// Runtime handle on a [`Message`]'s compile-time `MESSAGE_TYPE` tag.
///
/// A mailbox's subscription table is keyed on `MessageType`, not on a Rust
/// `TypeId`: two distinct Rust types that happen to share a `MESSAGE_TYPE`
/// string are treated as the same wire-level message kind. This mirrors the
/// [`Message`] trait's own contract (identity lives in the const, not in the
/// concrete type) and keeps the routing table free of `std::any::TypeId`.
///
/// # Example
/// ```rust
/// use agentbeam::message::{Message, MessageType};
///
/// #[derive(Debug, Clone)]
/// struct Ping;
/// impl Message for Ping {
///     const MESSAGE_TYPE: &'static str = "ping";
/// }
///
/// assert_eq!(MessageType::of::<Ping>(), MessageType::from_tag("ping"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageType(&'static str);

impl MessageType {
    pub fn of<M: Message>() -> Self {
        Self(M::MESSAGE_TYPE)
    }

    pub fn from_tag(tag: &'static str) -> Self {
        Self(tag)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A type-erased message payload, downcastable back to its concrete [`Message`]
/// type by a subscription handler that already knows what it registered for.
///
/// Grounded on the same `Arc<dyn Any + Send + Sync>` + explicit type-tag
/// pattern used by dispatcher-interface implementations that must hand one
/// heterogeneous queue many distinct payload types without a generic
/// parameter on the queue itself.
#[derive(Clone)]
pub struct AnyMessage {
    payload: Arc<dyn Any + Send + Sync>,
    message_type: MessageType,
}

impl AnyMessage {
    pub fn new<M: Message>(payload: M) -> Self {
        Self {
            payload: Arc::new(payload),
            message_type: MessageType::of::<M>(),
        }
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Downcast to the concrete message type, or `None` if `M`'s tag does not
    /// match the tag this value was constructed with.
    pub fn downcast_ref<M: Message>(&self) -> Option<&M> {
        if self.message_type != MessageType::of::<M>() {
            return None;
        }
        self.payload.downcast_ref::<M>()
    }
}

impl fmt::Debug for AnyMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyMessage")
            .field("message_type", &self.message_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Ping {
        n: u32,
    }

    impl Message for Ping {
        const MESSAGE_TYPE: &'static str = "ping";
    }

    #[derive(Debug, Clone)]
    struct Pong;

    impl Message for Pong {
        const MESSAGE_TYPE: &'static str = "pong";
    }

    #[test]
    fn message_type_of_matches_tag() {
        assert_eq!(MessageType::of::<Ping>(), MessageType::from_tag("ping"));
        assert_ne!(MessageType::of::<Ping>(), MessageType::of::<Pong>());
    }

    #[test]
    fn roundtrip_downcast() {
        let any = AnyMessage::new(Ping { n: 7 });
        assert_eq!(any.downcast_ref::<Ping>(), Some(&Ping { n: 7 }));
    }

    #[test]
    fn downcast_rejects_wrong_type() {
        let any = AnyMessage::new(Ping { n: 7 });
        assert!(any.downcast_ref::<Pong>().is_none());
    }

    #[test]
    fn clone_shares_payload() {
        let any = AnyMessage::new(Ping { n: 1 });
        let cloned = any.clone();
        assert_eq!(cloned.message_type(), any.message_type());
    }
}
