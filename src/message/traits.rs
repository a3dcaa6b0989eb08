// Layer 1: Standard library imports
use std::fmt::Debug;
use std::marker::PhantomData;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
// (none)

/// Core message trait with compile-time type identification.
///
/// # Zero-Cost Abstraction
/// Uses `const MESSAGE_TYPE` instead of runtime reflection for subscription-key
/// identity. The const is turned into a runtime [`crate::message::MessageType`]
/// value only once a message is handed to the mailbox layer, because a mailbox
/// routes dynamically between many message types at once.
///
/// # Example
/// ```rust
/// use agentbeam::message::{Message, MessagePriority};
///
/// #[derive(Debug, Clone)]
/// struct OrderPlaced { order_id: u64 }
///
/// impl Message for OrderPlaced {
///     const MESSAGE_TYPE: &'static str = "orders::order_placed";
///
///     fn priority(&self) -> MessagePriority {
///         MessagePriority::High
///     }
/// }
/// ```
pub trait Message: Send + Sync + Debug + 'static {
    /// Unique message type identifier (compile-time constant). Equality of this
    /// tag between two messages is exactly the subscription-table lookup key.
    const MESSAGE_TYPE: &'static str;

    /// Routing priority. Only meaningful to application code that chooses to
    /// read it; the four canonical dispatcher strategies deliver FIFO.
    fn priority(&self) -> MessagePriority {
        MessagePriority::Normal
    }
}

/// Message priority levels.
///
/// Priority ordering: Critical > High > Normal > Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum MessagePriority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// A zero-payload message identified solely by its type tag.
///
/// Distinct signals are distinct Rust types: define a marker type per signal
/// (e.g. `struct Bell;`) and use `Signal<Bell>` as the message type, so that
/// one signal's subscribers never see another signal's deliveries even though
/// neither carries data.
///
/// # Example
/// ```rust
/// use agentbeam::message::Signal;
///
/// struct Bell;
/// let signal = Signal::<Bell>::new();
/// let _ = signal;
/// ```
pub struct Signal<Tag: 'static>(PhantomData<Tag>);

impl<Tag: 'static> Debug for Signal<Tag> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Signal").field(&self.0).finish()
    }
}

impl<Tag: 'static> Signal<Tag> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<Tag: 'static> Default for Signal<Tag> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tag: 'static> Clone for Signal<Tag> {
    fn clone(&self) -> Self {
        Self(PhantomData)
    }
}

impl<Tag: 'static> Copy for Signal<Tag> {}

impl<Tag: Send + Sync + 'static> Message for Signal<Tag> {
    const MESSAGE_TYPE: &'static str = std::any::type_name::<Tag>();
}
