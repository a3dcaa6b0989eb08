//! Cooperation registration/deregistration error types.

// Layer 1: Standard library imports
// (none for this module)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::agent::AgentDefineError;
use crate::dispatcher::DispatcherError;
use crate::mailbox::MailboxError;

#[derive(Debug, Error)]
pub enum CooperationError {
    #[error("cooperation name already registered: {name}")]
    DuplicateName { name: String },

    #[error("dispatcher rejected an agent binding during registration: {0}")]
    Binding(#[from] DispatcherError),

    #[error("agent definition failed during registration: {0}")]
    Define(#[from] AgentDefineError),

    #[error("mailbox subscription failed during registration: {0}")]
    Subscription(#[from] MailboxError),

    #[error("unknown cooperation")]
    UnknownCooperation,
}
