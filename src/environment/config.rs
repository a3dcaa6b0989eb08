//! Builder-driven assembly of an [`super::Environment`], mirroring the
//! reference runtime's `SystemConfig`/builder shape: construction-time
//! choices (which named dispatchers exist, what observes mailbox delivery)
//! are collected here and only turned into live threads once `build()` runs.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use super::environment::Environment;
use crate::dispatcher::{LockStyle, ThreadPoolParams};
use crate::monitoring::{CooperationEvent, MailboxEvent, Monitor};

/// Which dispatcher strategy to build, and the parameters each strategy needs.
#[derive(Debug, Clone)]
pub enum DispatcherKind {
    OneThread { lock_style: LockStyle },
    ActiveObject { lock_style: LockStyle },
    ActiveGroup { lock_style: LockStyle },
    ThreadPool { params: ThreadPoolParams },
}

impl DispatcherKind {
    pub fn one_thread() -> Self {
        Self::OneThread { lock_style: LockStyle::Mutex }
    }

    pub fn active_object() -> Self {
        Self::ActiveObject { lock_style: LockStyle::Mutex }
    }

    pub fn active_group() -> Self {
        Self::ActiveGroup { lock_style: LockStyle::Mutex }
    }

    pub fn thread_pool() -> Self {
        Self::ThreadPool { params: ThreadPoolParams::default() }
    }
}

/// Assembled configuration an [`Environment`] is built from.
///
/// Produced by [`EnvironmentBuilder`]; not constructed directly.
pub struct EnvironmentConfig {
    pub(crate) named_dispatchers: Vec<(String, DispatcherKind)>,
    pub(crate) message_delivery_tracer: Option<Arc<dyn Fn(MailboxEvent) + Send + Sync>>,
    pub(crate) cooperation_diagnostics: Option<Arc<dyn Fn(CooperationEvent) + Send + Sync>>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            named_dispatchers: Vec::new(),
            message_delivery_tracer: None,
            cooperation_diagnostics: None,
        }
    }
}

/// Fluent assembly of an [`EnvironmentConfig`], turned into a running
/// [`Environment`] by [`EnvironmentBuilder::build`].
///
/// # Example
/// ```rust
/// use agentbeam::environment::{DispatcherKind, EnvironmentBuilder};
///
/// let env = EnvironmentBuilder::new()
///     .with_named_dispatcher("io", DispatcherKind::one_thread())
///     .build();
/// ```
#[derive(Default)]
pub struct EnvironmentBuilder {
    config: EnvironmentConfig,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named dispatcher to be constructed when the environment
    /// starts — see `add_named_dispatcher` for registering one built ahead
    /// of time instead.
    pub fn with_named_dispatcher(mut self, name: impl Into<String>, kind: DispatcherKind) -> Self {
        self.config.named_dispatchers.push((name.into(), kind));
        self
    }

    /// Turn every mailbox delivery into a monitoring event via `monitor`.
    /// This is the `message_delivery_tracer` hook (§6): the core only owns
    /// the call site, not a particular rendering of the resulting events.
    pub fn with_message_delivery_tracer<M>(mut self, monitor: M) -> Self
    where
        M: Monitor<MailboxEvent> + 'static,
    {
        self.config.message_delivery_tracer = Some(Arc::new(move |event| {
            let _ = monitor.record(event);
        }));
        self
    }

    /// Turn every cooperation/agent supervisory event into a monitoring event.
    pub fn with_cooperation_monitor<M>(mut self, monitor: M) -> Self
    where
        M: Monitor<CooperationEvent> + 'static,
    {
        self.config.cooperation_diagnostics = Some(Arc::new(move |event| {
            let _ = monitor.record(event);
        }));
        self
    }

    pub fn build(self) -> Arc<Environment> {
        Environment::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::NoopMonitor;

    #[test]
    fn builder_collects_named_dispatcher_requests() {
        let config = EnvironmentBuilder::new()
            .with_named_dispatcher("io", DispatcherKind::one_thread())
            .with_named_dispatcher("cpu", DispatcherKind::thread_pool())
            .config;
        assert_eq!(config.named_dispatchers.len(), 2);
    }

    #[test]
    fn tracer_and_diagnostics_default_to_none() {
        assert!(EnvironmentConfig::default().message_delivery_tracer.is_none());
        assert!(EnvironmentConfig::default().cooperation_diagnostics.is_none());
    }

    #[test]
    fn with_message_delivery_tracer_installs_a_sink() {
        let config = EnvironmentBuilder::new()
            .with_message_delivery_tracer(NoopMonitor::<MailboxEvent>::new())
            .config;
        assert!(config.message_delivery_tracer.is_some());
    }
}
