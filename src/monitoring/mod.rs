//! # Monitoring Module
//!
//! Synchronous diagnostics infrastructure for observing events across the
//! runtime: agent lifecycle, cooperation supervision reactions, mailbox
//! routing, and environment-level events. Doubles as the `message_delivery_tracer`
//! hook surface described in [`crate::environment`].
//!
//! ## Event Types
//! - [`CooperationEvent`]: cooperation registration/deregistration, restart reactions
//! - [`AgentEvent`]: agent lifecycle and message processing
//! - [`EnvironmentEvent`]: environment-level events
//! - [`MailboxEvent`]: mailbox routing, subscription changes, backpressure
//!
//! ## Example
//! ```rust
//! use agentbeam::monitoring::{InMemoryMonitor, Monitor, MonitoringConfig, AgentEvent, AgentEventKind};
//! use agentbeam::util::AgentId;
//! use chrono::Utc;
//! use std::collections::HashMap;
//!
//! let monitor = InMemoryMonitor::new(MonitoringConfig::default());
//! monitor.record(AgentEvent {
//!     timestamp: Utc::now(),
//!     agent_id: AgentId::new(),
//!     event_kind: AgentEventKind::Started,
//!     metadata: HashMap::new(),
//! }).expect("record");
//! assert_eq!(monitor.snapshot().expect("snapshot").total_events, 1);
//! ```

pub mod error;
pub mod in_memory;
pub mod noop;
pub mod traits;
pub mod types;

pub use error::MonitoringError;
pub use in_memory::InMemoryMonitor;
pub use noop::NoopMonitor;
pub use traits::{EventSeverity, Monitor, MonitoringEvent};
pub use types::{
    AgentEvent, AgentEventKind, CooperationEvent, CooperationEventKind, EnvironmentEvent,
    EnvironmentEventKind, MailboxEvent, MailboxEventKind, MonitoringConfig, MonitoringSnapshot,
};
