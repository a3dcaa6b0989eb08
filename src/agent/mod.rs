//! Agent definition, lifecycle, and the context handed to handler closures.

pub mod context;
pub mod handle;
pub mod lifecycle;
pub mod traits;

pub use context::{AgentContext, DefineContext, EnvironmentServices, Subscribing};
pub use handle::AgentHandle;
pub use lifecycle::{AgentLifecycle, AgentState};
pub use traits::{Agent, AgentDefineError, AsAnyMut, ExceptionReaction};
