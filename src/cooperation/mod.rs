//! Cooperations: atomically registered groups of agents, and the
//! supervisory reactions (abort, ignore, restart, escalate) applied when one
//! of their agents panics.
//!
//! Generalizes the reference supervisor's dynamic `add_child`/restart-strategy
//! model into the runtime's batch registration transaction (§4.4): a
//! cooperation's agent set is declared up front as a [`CooperationSpec`] and
//! bound together, either entirely or not at all.

pub mod backoff;
pub mod binder;
pub mod cooperation;
pub mod errors;
pub mod registry;
pub mod spec;
pub mod state;

pub use backoff::RestartBackoff;
pub use binder::Binder;
pub use cooperation::Cooperation;
pub use errors::CooperationError;
pub use registry::CooperationRegistry;
pub use spec::{AgentSpec, CooperationSpec};
pub use state::CooperationState;
