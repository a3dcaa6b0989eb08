//! Hierarchical state-chart facility: nested states with entry/exit actions
//! and least-common-ancestor transition logic.

pub mod machine;
pub mod state;

pub use machine::StateMachine;
pub use state::StateId;
