//! Monitoring event types and configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::traits::{EventSeverity, MonitoringEvent};
use crate::util::AgentId;

/// Configuration for monitoring behavior.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub max_history_size: usize,
    pub severity_filter: EventSeverity,
    #[serde(with = "crate::util::duration_serde")]
    pub snapshot_interval: Duration,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_history_size: 1000,
            severity_filter: EventSeverity::Info,
            snapshot_interval: Duration::from_secs(60),
        }
    }
}

/// Snapshot of monitoring state at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringSnapshot<E: MonitoringEvent> {
    pub timestamp: DateTime<Utc>,
    pub total_events: u64,
    pub trace_count: u64,
    pub debug_count: u64,
    pub info_count: u64,
    pub warning_count: u64,
    pub error_count: u64,
    pub critical_count: u64,
    pub recent_events: Vec<E>,
}

// ============================================================================
// Cooperation Events
// ============================================================================

/// Events related to cooperation registration and the supervisory reactions
/// applied to the agents it owns.
#[derive(Debug, Clone, Serialize)]
pub struct CooperationEvent {
    pub timestamp: DateTime<Utc>,
    pub cooperation_id: String,
    pub agent_id: Option<String>,
    pub event_kind: CooperationEventKind,
    pub metadata: HashMap<String, String>,
}

impl MonitoringEvent for CooperationEvent {
    const EVENT_TYPE: &'static str = "cooperation";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.event_kind {
            CooperationEventKind::Registered => EventSeverity::Info,
            CooperationEventKind::Deregistered => EventSeverity::Info,
            CooperationEventKind::AgentFailed { .. } => EventSeverity::Error,
            CooperationEventKind::AgentRestarted { .. } => EventSeverity::Warning,
            CooperationEventKind::RestartLimitExceeded { .. } => EventSeverity::Critical,
            CooperationEventKind::ReactionApplied { .. } => EventSeverity::Info,
        }
    }
}

/// Specific types of cooperation events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum CooperationEventKind {
    /// Cooperation successfully registered (all agents bound atomically)
    Registered,

    /// Cooperation deregistered (depth-first child teardown completed)
    Deregistered,

    /// An agent inside the cooperation raised an unhandled exception
    AgentFailed {
        error: String,
        restart_count: u32,
    },

    /// An agent was restarted after an exception reaction of `restart-agent`
    AgentRestarted { restart_count: u32 },

    /// Restart rate limit exceeded, escalating to the parent cooperation
    RestartLimitExceeded {
        restart_count: u32,
        #[serde(with = "crate::util::duration_serde")]
        window: Duration,
    },

    /// An exception reaction was applied to a failing agent
    ReactionApplied {
        reaction: String,
    },
}

// ============================================================================
// Agent Events
// ============================================================================

/// Events related to agent lifecycle and message processing.
#[derive(Debug, Clone, Serialize)]
pub struct AgentEvent {
    pub timestamp: DateTime<Utc>,
    pub agent_id: AgentId,
    pub event_kind: AgentEventKind,
    pub metadata: HashMap<String, String>,
}

impl MonitoringEvent for AgentEvent {
    const EVENT_TYPE: &'static str = "agent";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.event_kind {
            AgentEventKind::Defined => EventSeverity::Debug,
            AgentEventKind::Started => EventSeverity::Info,
            AgentEventKind::MessageReceived { .. } => EventSeverity::Trace,
            AgentEventKind::MessageProcessed { .. } => EventSeverity::Trace,
            AgentEventKind::ErrorOccurred { .. } => EventSeverity::Error,
            AgentEventKind::Deregistered => EventSeverity::Info,
        }
    }
}

/// Specific types of agent events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum AgentEventKind {
    /// Agent's `define()` completed, subscriptions recorded
    Defined,

    /// Agent transitioned to `Running`, `on_start` completed
    Started,

    MessageReceived { message_type: String },

    MessageProcessed {
        message_type: String,
        duration_micros: u64,
    },

    ErrorOccurred { error: String },

    /// Agent transitioned to `Deregistered`, `on_finish` completed
    Deregistered,
}

// ============================================================================
// Environment Events
// ============================================================================

/// Events related to environment-level operations.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentEvent {
    pub timestamp: DateTime<Utc>,
    pub event_kind: EnvironmentEventKind,
    pub metadata: HashMap<String, String>,
}

impl MonitoringEvent for EnvironmentEvent {
    const EVENT_TYPE: &'static str = "environment";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.event_kind {
            EnvironmentEventKind::Started => EventSeverity::Info,
            EnvironmentEventKind::Shutdown => EventSeverity::Info,
            EnvironmentEventKind::CooperationRegistered { .. } => EventSeverity::Debug,
            EnvironmentEventKind::CooperationDeregistered { .. } => EventSeverity::Debug,
            EnvironmentEventKind::ConfigurationChanged => EventSeverity::Info,
        }
    }
}

/// Specific types of environment events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum EnvironmentEventKind {
    Started,
    Shutdown,
    CooperationRegistered { cooperation_id: String },
    CooperationDeregistered { cooperation_id: String },
    ConfigurationChanged,
}

// ============================================================================
// Mailbox Events
// ============================================================================

/// Events related to mailbox routing, subscription changes and backpressure.
#[derive(Debug, Clone, Serialize)]
pub struct MailboxEvent {
    pub timestamp: DateTime<Utc>,
    pub mailbox: String,
    pub event_kind: MailboxEventKind,
    pub metadata: HashMap<String, String>,
}

impl MonitoringEvent for MailboxEvent {
    const EVENT_TYPE: &'static str = "mailbox";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match &self.event_kind {
            MailboxEventKind::Delivered { .. } => EventSeverity::Trace,
            MailboxEventKind::Subscribed { .. } => EventSeverity::Debug,
            MailboxEventKind::Unsubscribed { .. } => EventSeverity::Debug,
            MailboxEventKind::NoHandler => EventSeverity::Warning,
            MailboxEventKind::MultipleHandlers { .. } => EventSeverity::Warning,
            MailboxEventKind::BackpressureApplied { .. } => EventSeverity::Warning,
            MailboxEventKind::CapacityReached => EventSeverity::Warning,
            MailboxEventKind::MessageDropped { .. } => EventSeverity::Error,
        }
    }
}

/// Specific types of mailbox events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum MailboxEventKind {
    /// Message matched at least one subscriber and a demand was enqueued
    Delivered { message_type: String, subscriber_count: usize },

    Subscribed { message_type: String },
    Unsubscribed { message_type: String },

    /// A service request found no registered handler
    NoHandler,

    /// A service request found more than one registered handler
    MultipleHandlers { count: usize },

    BackpressureApplied { strategy: String },
    CapacityReached,
    MessageDropped { reason: String },
}
