//! Message system: compile-time typed at the application boundary, type-erased
//! once it enters a mailbox's heterogeneous subscription table.

pub mod any;
pub mod envelope;
pub mod traits;

pub use any::{AnyMessage, MessageType};
pub use envelope::MessageEnvelope;
pub use traits::{Message, MessagePriority, Signal};
