//! Core monitoring traits for universal event observation.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::MonitoringError;
use super::types::MonitoringSnapshot;

/// Event severity levels for filtering and categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EventSeverity {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

/// Trait for events that can be monitored.
///
/// # Example
/// ```
/// use agentbeam::monitoring::{MonitoringEvent, EventSeverity};
/// use chrono::{DateTime, Utc};
/// use serde::Serialize;
///
/// #[derive(Debug, Clone, Serialize)]
/// struct MyEvent {
///     timestamp: DateTime<Utc>,
///     message: String,
/// }
///
/// impl MonitoringEvent for MyEvent {
///     const EVENT_TYPE: &'static str = "my_event";
///
///     fn timestamp(&self) -> DateTime<Utc> {
///         self.timestamp
///     }
///
///     fn severity(&self) -> EventSeverity {
///         EventSeverity::Info
///     }
/// }
/// ```
pub trait MonitoringEvent: Send + Sync + Clone + Debug + Serialize + 'static {
    const EVENT_TYPE: &'static str;

    fn timestamp(&self) -> DateTime<Utc>;

    fn severity(&self) -> EventSeverity;
}

/// Generic synchronous monitoring trait for observing and tracking events.
///
/// The dispatcher core never suspends, so this trait (and every
/// implementation of it) is a plain blocking call, not an `async fn` —
/// the tracer runs on the same OS thread that is processing a demand.
///
/// # Examples
/// ```
/// use agentbeam::monitoring::{Monitor, MonitoringEvent, EventSeverity, MonitoringConfig, InMemoryMonitor, AgentEvent, AgentEventKind};
/// use agentbeam::util::AgentId;
/// use chrono::Utc;
/// use std::collections::HashMap;
///
/// let monitor = InMemoryMonitor::new(MonitoringConfig::default());
/// let event = AgentEvent {
///     timestamp: Utc::now(),
///     agent_id: AgentId::new(),
///     event_kind: AgentEventKind::Started,
///     metadata: HashMap::new(),
/// };
/// monitor.record(event).expect("record");
/// let snapshot = monitor.snapshot().expect("snapshot");
/// assert_eq!(snapshot.total_events, 1);
/// ```
pub trait Monitor<E: MonitoringEvent>: Send + Sync + Clone {
    /// Records a monitoring event.
    fn record(&self, event: E) -> Result<(), MonitoringError>;

    /// Generates a snapshot of the current monitoring state.
    fn snapshot(&self) -> Result<MonitoringSnapshot<E>, MonitoringError>;

    /// Resets the monitor state, clearing all counters and history.
    fn reset(&self) -> Result<(), MonitoringError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize)]
    struct TestEvent {
        timestamp: DateTime<Utc>,
        message: String,
        severity: EventSeverity,
    }

    impl MonitoringEvent for TestEvent {
        const EVENT_TYPE: &'static str = "test_event";

        fn timestamp(&self) -> DateTime<Utc> {
            self.timestamp
        }

        fn severity(&self) -> EventSeverity {
            self.severity
        }
    }

    #[test]
    fn event_severity_ordering() {
        assert!(EventSeverity::Trace < EventSeverity::Debug);
        assert!(EventSeverity::Debug < EventSeverity::Info);
        assert!(EventSeverity::Info < EventSeverity::Warning);
        assert!(EventSeverity::Warning < EventSeverity::Error);
        assert!(EventSeverity::Error < EventSeverity::Critical);
    }

    #[test]
    fn monitoring_event_implementation() {
        let now = Utc::now();
        let event = TestEvent {
            timestamp: now,
            message: "Test message".to_string(),
            severity: EventSeverity::Info,
        };

        assert_eq!(event.timestamp(), now);
        assert_eq!(event.severity(), EventSeverity::Info);
        assert_eq!(TestEvent::EVENT_TYPE, "test_event");
    }

    #[test]
    fn event_severity_serialization() {
        let json = serde_json::to_string(&EventSeverity::Warning).expect("serialize");
        assert!(json.contains("Warning"));
    }
}
