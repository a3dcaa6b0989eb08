//! Prelude module for convenient imports.
//!
//! Re-exports the types most applications need to define agents, assemble an
//! environment, and register cooperations. Import this module to get started
//! quickly:
//!
//! ```rust
//! use agentbeam::prelude::*;
//! ```
//!
//! # What's Included
//!
//! ## Agents
//! - [`Agent`] - the trait every agent implements
//! - [`AgentContext`] - context passed to handlers and lifecycle hooks
//! - [`DefineContext`] - subscription builder used in `Agent::define`
//! - [`AgentDefineError`] - error returned from `Agent::define`
//! - [`ExceptionReaction`] - how a cooperation reacts to a handler panic
//!
//! ## Messaging
//! - [`Message`] - the trait every message type implements
//! - [`MessageEnvelope`] - type-erased envelope carrying routing metadata
//! - [`MessagePriority`] - priority levels (High, Normal, Low)
//! - [`Mailbox`] - subscription table routing messages to agents
//!
//! ## Cooperation and Dispatch
//! - [`CooperationSpec`], [`AgentSpec`] - declarative cooperation assembly
//! - [`Binder`] - binds an agent to a dispatcher
//! - [`Cooperation`] - a registered, supervised group of agents
//! - [`Dispatcher`] - the scheduling strategy trait
//! - [`DispatcherKind`] - chooses which built-in strategy `Environment` builds
//! - [`LockStyle`] - queue locking strategy shared by every dispatcher
//!
//! ## Environment
//! - [`Environment`] - the runtime's root object
//! - [`EnvironmentBuilder`] - fluent assembly of an `Environment`
//!
//! ## Timers and State Charts
//! - [`TimerHandle`] - a cancellable handle to a scheduled timer
//! - [`StateMachine`], [`StateId`] - hierarchical state-chart support
//!
//! ## Monitoring
//! - [`Monitor`] - the synchronous event-recording trait
//! - [`InMemoryMonitor`], [`NoopMonitor`] - the two built-in monitors
//! - [`MonitoringEvent`], [`EventSeverity`]
//!
//! ## Identifiers
//! - [`AgentId`], [`CooperationId`], [`MailboxAddress`], [`MessageId`]

// Agents
pub use crate::agent::{Agent, AgentContext, AgentDefineError, DefineContext, ExceptionReaction};

// Messaging
pub use crate::message::{Message, MessageEnvelope, MessagePriority};

// Mailbox
pub use crate::mailbox::Mailbox;

// Cooperation and dispatch
pub use crate::cooperation::{AgentSpec, Binder, Cooperation, CooperationSpec};
pub use crate::dispatcher::{Dispatcher, LockStyle};

// Environment
pub use crate::environment::{DispatcherKind, Environment, EnvironmentBuilder};

// Timers and state charts
pub use crate::statechart::{StateId, StateMachine};
pub use crate::timer::TimerHandle;

// Monitoring
pub use crate::monitoring::{EventSeverity, InMemoryMonitor, Monitor, MonitoringEvent, NoopMonitor};

// Identifiers
pub use crate::util::{AgentId, CooperationId, MailboxAddress, MessageId};
