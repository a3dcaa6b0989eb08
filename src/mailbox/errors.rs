//! Mailbox error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailboxError {
    /// A service request found no registered handler for its message type.
    #[error("no handler registered for this service request")]
    NoHandler,

    /// A service request found more than one registered handler; routing is
    /// ambiguous so the request is rejected rather than picking arbitrarily.
    #[error("{count} handlers registered for this service request, expected exactly one")]
    MultipleHandlers { count: usize },

    /// A direct mailbox already has a bound subscriber for this message type.
    #[error("mailbox already bound to an agent for this message type")]
    AlreadyBound,

    /// A service request's reply did not arrive before the timeout elapsed.
    #[error("service request timed out waiting for a reply")]
    Timeout,
}
