// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Layer 2: Third-party crate imports
use uuid::Uuid;

// Layer 3: Internal module imports
// (none)

/// Opaque identifier for a scheduled timer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(Uuid);

impl TimerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimerId {
    fn default() -> Self {
        Self::new()
    }
}

/// A cancellable handle to a scheduled one-shot or periodic timer.
///
/// Holding the handle keeps the scheduled delivery alive; releasing the last
/// strong reference to it cancels future deliveries, the same RAII token
/// behaviour as an explicit [`TimerHandle::cancel`] call. Cloning the handle
/// shares ownership of that token — the timer only cancels once every clone
/// has been dropped.
///
/// Cancellation is not retroactive: a periodic timer's demand that has
/// already been enqueued before cancellation (whether via `cancel()` or the
/// last clone dropping) still fires. Cancelling only stops *future* firings.
///
/// # Example
/// ```rust
/// use agentbeam::timer::TimerHandle;
///
/// let handle = TimerHandle::inert();
/// assert!(!handle.is_cancelled());
/// handle.cancel();
/// assert!(handle.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: TimerId,
    cancelled: Arc<AtomicBool>,
    // Counts live `TimerHandle`s sharing this timer entry. Never handed out
    // except through `Clone`, so `Drop` can tell whether it is releasing the
    // last one.
    refs: Arc<()>,
}

impl TimerHandle {
    pub(crate) fn new(id: TimerId) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
            refs: Arc::new(()),
        }
    }

    /// A handle with no backing timer entry: useful for test doubles and for
    /// environment services that discard timer results.
    pub fn inert() -> Self {
        Self::new(TimerId::new())
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn cancelled_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if Arc::strong_count(&self.refs) == 1 {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }
}
