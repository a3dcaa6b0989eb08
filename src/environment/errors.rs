//! Errors surfaced by the environment's synchronous registration APIs.
//!
//! Handler failures are never surfaced here — those are routed through an
//! agent's `exception_reaction` and recorded as monitoring events instead
//! (§7): this enum only covers the synchronous calls an application makes
//! while assembling an environment.

// Layer 1: Standard library imports
// (none for this module)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::cooperation::CooperationError;
use crate::dispatcher::DispatcherError;

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("cooperation name already registered: {name}")]
    DuplicateCooperationName { name: String },

    #[error("mailbox name already registered: {name}")]
    DuplicateMailboxName { name: String },

    #[error("dispatcher rejected an agent binding: {reason}")]
    BindingFailure { reason: String },

    #[error("cooperation registration failed: {0}")]
    RegistrationFailed(String),

    #[error("unknown cooperation")]
    UnknownCooperation,
}

impl From<CooperationError> for EnvironmentError {
    fn from(err: CooperationError) -> Self {
        match err {
            CooperationError::DuplicateName { name } => Self::DuplicateCooperationName { name },
            CooperationError::Binding(DispatcherError::BindingFailure { reason }) => Self::BindingFailure { reason },
            CooperationError::Define(_) | CooperationError::Subscription(_) => Self::RegistrationFailed(err.to_string()),
            CooperationError::UnknownCooperation => Self::UnknownCooperation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentDefineError;

    #[test]
    fn duplicate_name_maps_through() {
        let err = EnvironmentError::from(CooperationError::DuplicateName { name: "workers".to_string() });
        assert!(matches!(err, EnvironmentError::DuplicateCooperationName { name } if name == "workers"));
    }

    #[test]
    fn define_failure_maps_to_registration_failed() {
        let err = EnvironmentError::from(CooperationError::Define(AgentDefineError::new("bad subscription")));
        assert!(matches!(err, EnvironmentError::RegistrationFailed(_)));
    }
}
