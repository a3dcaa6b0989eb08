//! Cooperation lifecycle states.

/// A cooperation's position in the registration/deregistration lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooperationState {
    /// Registration transaction in progress; not yet visible to lookups.
    Registering,
    /// Fully registered; agents are bound and receiving demands.
    Active,
    /// Deregistration in progress: children are being torn down, then agents.
    Deregistering,
    /// Terminal: no agents bound, no further transitions possible.
    Deregistered,
}

impl CooperationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CooperationState::Deregistered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_deregistered_is_terminal() {
        assert!(!CooperationState::Registering.is_terminal());
        assert!(!CooperationState::Active.is_terminal());
        assert!(!CooperationState::Deregistering.is_terminal());
        assert!(CooperationState::Deregistered.is_terminal());
    }
}
