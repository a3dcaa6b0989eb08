// Layer 1: Standard library imports
use std::any::Any;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use super::context::{AgentContext, DefineContext};

/// Blanket helper giving every `'static` type a type-erased downcast path,
/// without requiring `Agent` implementors to write any boilerplate.
pub trait AsAnyMut {
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAnyMut for T {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// An agent: the unit of state and behaviour that a cooperation registers
/// and a dispatcher runs.
///
/// Agents are defined, not spawned: `define()` runs once, synchronously,
/// while the owning cooperation's registration transaction holds the
/// environment lock, and its only job is to record subscriptions via
/// [`DefineContext::subscribe`]. Everything else — actually reacting to
/// messages — happens in handler closures supplied to `subscribe`, not in
/// trait methods, because one agent may subscribe to many mailboxes and many
/// message types with distinct handler bodies.
///
/// # Example
/// ```rust
/// use agentbeam::agent::{Agent, AgentContext, DefineContext, AgentDefineError};
/// use agentbeam::mailbox::Mailbox;
/// use agentbeam::message::Message;
///
/// #[derive(Debug, Clone)]
/// struct Greet { name: String }
/// impl Message for Greet {
///     const MESSAGE_TYPE: &'static str = "greet";
/// }
///
/// struct Greeter { greetings_sent: u32 }
///
/// impl Greeter {
///     fn on_greet(&mut self, msg: &Greet, _ctx: &mut AgentContext) {
///         self.greetings_sent += 1;
///         println!("Hello, {}!", msg.name);
///     }
/// }
///
/// impl Agent for Greeter {
///     fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
///         Ok(())
///     }
/// }
/// ```
pub trait Agent: AsAnyMut + Send + 'static {
    /// Record this agent's subscriptions. Runs once, synchronously, while the
    /// cooperation is being registered. Failing here rolls back the whole
    /// cooperation's registration transaction.
    fn define(&mut self, ctx: &mut DefineContext) -> Result<(), AgentDefineError>;

    /// Runs once the agent is bound and before it can receive demands.
    fn on_start(&mut self, _ctx: &mut AgentContext) {}

    /// Runs once, during deregistration, after the agent stops receiving demands.
    fn on_finish(&mut self, _ctx: &mut AgentContext) {}

    /// How the owning cooperation should react when a handler invocation
    /// panics. Default matches SObjectizer's historical default: abort the
    /// agent (deregister it) rather than silently continuing or crashing the
    /// whole cooperation.
    fn exception_reaction(&self) -> ExceptionReaction {
        ExceptionReaction::AbortOnException
    }
}

/// Error returned from [`Agent::define`]. Rolls back the entire cooperation
/// registration transaction: no agent in a cooperation ever runs partially
/// registered.
#[derive(Debug, Clone, thiserror::Error)]
#[error("agent definition failed: {message}")]
pub struct AgentDefineError {
    pub message: String,
}

impl AgentDefineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The reaction a cooperation applies when one of its agents' handlers panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionReaction {
    /// Deregister the failing agent; its siblings are unaffected.
    AbortOnException,
    /// Log the exception and keep the agent running.
    IgnoreException,
    /// Deregister and re-register the agent (re-running `define`/`on_start`),
    /// subject to the cooperation's restart-rate limit.
    RestartAgent,
    /// Deregister the entire cooperation and propagate the failure to its parent.
    EscalateToCooperation,
    /// Stop the whole environment: every cooperation is deregistered and
    /// `Environment::start` returns, as if `stop()` had been called.
    ShutdownEnvironment,
}
