//! The per-queue locking strategy a dispatcher uses to guard its demand
//! queues, and the queue itself.
//!
//! Grounded on the SObjectizer `queue_traits::lock_factory` concept: queues
//! are pluggable between a condvar-parked mutex (the default, good for
//! queues that are idle more often than not) and a short busy-spin (an
//! opt-in for queues expected to have very short idle windows, trading CPU
//! for reduced wakeup latency).

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

// Layer 2: Third-party crate imports
use parking_lot::{Condvar, Mutex};

// Layer 3: Internal module imports
use crate::demand::Demand;

/// How a [`DemandQueue`] waits for work when it is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockStyle {
    /// Park on a condvar; wakes promptly with no CPU spent while idle.
    #[default]
    Mutex,
    /// Busy-spin between lock attempts; lower wakeup latency at the cost of
    /// burning a core while idle. Intended for short-lived, high-churn queues.
    Spin,
}

/// An agent-bound or group-bound or cooperation-bound FIFO queue of demands.
pub struct DemandQueue {
    style: LockStyle,
    state: Mutex<VecDeque<Demand>>,
    ready: Condvar,
    closed: AtomicBool,
}

impl DemandQueue {
    pub fn new(style: LockStyle) -> Self {
        Self {
            style,
            state: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn push(&self, demand: Demand) {
        self.state.lock().push_back(demand);
        self.ready.notify_one();
    }

    /// Mark the queue closed: wakes every waiter; subsequent `pop_blocking`
    /// calls still drain whatever was already queued, then return `None`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.state.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until a demand is available, or return `None` once the queue
    /// has been closed and drained.
    pub fn pop_blocking(&self) -> Option<Demand> {
        match self.style {
            LockStyle::Mutex => {
                let mut guard = self.state.lock();
                loop {
                    if let Some(demand) = guard.pop_front() {
                        return Some(demand);
                    }
                    if self.closed.load(Ordering::SeqCst) {
                        return None;
                    }
                    self.ready.wait(&mut guard);
                }
            }
            LockStyle::Spin => loop {
                if let Some(mut guard) = self.state.try_lock() {
                    if let Some(demand) = guard.pop_front() {
                        return Some(demand);
                    }
                }
                if self.closed.load(Ordering::SeqCst) {
                    let mut guard = self.state.lock();
                    return guard.pop_front();
                }
                std::hint::spin_loop();
            },
        }
    }

    /// Pop up to `max` demands without blocking. Used by the thread-pool
    /// dispatcher to bound how much of one cooperation's backlog a single
    /// worker consumes before rotating the queue back to the ready set.
    pub fn pop_up_to(&self, max: usize) -> Vec<Demand> {
        let mut guard = self.state.lock();
        let take = max.min(guard.len());
        guard.drain(..take).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, AgentDefineError, DefineContext};
    use crate::message::{Message, MessageEnvelope};
    use crate::util::AgentId;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct Ping;
    impl Message for Ping {
        const MESSAGE_TYPE: &'static str = "ping";
    }
    struct NoopAgent;
    impl Agent for NoopAgent {
        fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
            Ok(())
        }
    }

    fn demand() -> Demand {
        Demand::new(Arc::new(MessageEnvelope::new(Ping)), AgentId::new(), Arc::new(|_a, _e, _c| {}))
    }

    #[test]
    fn fifo_order_is_preserved_mutex_style() {
        let queue = DemandQueue::new(LockStyle::Mutex);
        let first = demand();
        let first_id = first.agent;
        queue.push(first);
        queue.push(demand());

        let popped = queue.pop_blocking().expect("first demand");
        assert_eq!(popped.agent, first_id);
    }

    #[test]
    fn fifo_order_is_preserved_spin_style() {
        let queue = DemandQueue::new(LockStyle::Spin);
        let first = demand();
        let first_id = first.agent;
        queue.push(first);
        queue.push(demand());

        let popped = queue.pop_blocking().expect("first demand");
        assert_eq!(popped.agent, first_id);
    }

    #[test]
    fn close_after_drain_returns_none() {
        let queue = DemandQueue::new(LockStyle::Mutex);
        queue.close();
        assert!(queue.pop_blocking().is_none());
    }

    #[test]
    fn close_still_drains_queued_demands_first() {
        let queue = DemandQueue::new(LockStyle::Mutex);
        queue.push(demand());
        queue.close();

        assert!(queue.pop_blocking().is_some());
        assert!(queue.pop_blocking().is_none());
    }

    #[test]
    fn pop_up_to_bounds_batch_size() {
        let queue = DemandQueue::new(LockStyle::Mutex);
        for _ in 0..5 {
            queue.push(demand());
        }
        let batch = queue.pop_up_to(3);
        assert_eq!(batch.len(), 3);
        assert_eq!(queue.len(), 2);
    }
}
