//! Background timer service: a single OS thread that fires one-shot and
//! periodic actions in fire-time order.

// Layer 1: Standard library imports
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// Layer 2: Third-party crate imports
use parking_lot::{Condvar, Mutex};

// Layer 3: Internal module imports
use super::handle::{TimerHandle, TimerId};

type Action = Arc<dyn Fn() + Send + Sync>;

struct ScheduledEntry {
    fire_at: Instant,
    period: Option<Duration>,
    seq: u64,
    id: TimerId,
    cancelled: Arc<AtomicBool>,
    action: Action,
}

impl PartialEq for ScheduledEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}
impl Eq for ScheduledEntry {}

impl PartialOrd for ScheduledEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEntry {
    // Reversed so `BinaryHeap` (a max-heap) pops the *earliest* fire time first.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct State {
    heap: BinaryHeap<ScheduledEntry>,
    shutdown: bool,
}

struct Inner {
    state: Mutex<State>,
    condvar: Condvar,
    next_seq: AtomicU64,
}

/// A background service that fires scheduled one-shot and periodic actions
/// on a single worker thread, in strict fire-time order.
///
/// Grounded on the same condition-variable-driven worker-thread pattern used
/// throughout the dispatcher core (see [`crate::dispatcher::one_thread`]):
/// the worker parks on the earliest pending entry rather than polling.
pub struct TimerService {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TimerService {
    pub fn new() -> Self {
        let inner = Arc::new(Inner {
            state: Mutex::new(State {
                heap: BinaryHeap::new(),
                shutdown: false,
            }),
            condvar: Condvar::new(),
            next_seq: AtomicU64::new(0),
        });

        let worker_inner = Arc::clone(&inner);
        let worker = thread::spawn(move || run_worker(worker_inner));

        Self {
            inner,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Schedule `action` to run once after `delay`.
    pub fn schedule_once(&self, delay: Duration, action: impl Fn() + Send + Sync + 'static) -> TimerHandle {
        self.schedule(delay, None, action)
    }

    /// Schedule `action` to run after `initial_delay`, then every `period`
    /// until the returned handle is cancelled.
    pub fn schedule_periodic(
        &self,
        initial_delay: Duration,
        period: Duration,
        action: impl Fn() + Send + Sync + 'static,
    ) -> TimerHandle {
        self.schedule(initial_delay, Some(period), action)
    }

    fn schedule(
        &self,
        delay: Duration,
        period: Option<Duration>,
        action: impl Fn() + Send + Sync + 'static,
    ) -> TimerHandle {
        let id = TimerId::new();
        let handle = TimerHandle::new(id);
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);

        let entry = ScheduledEntry {
            fire_at: Instant::now() + delay,
            period,
            seq,
            id,
            cancelled: handle.cancelled_flag(),
            action: Arc::new(action),
        };

        let mut state = self.inner.state.lock();
        state.heap.push(entry);
        self.inner.condvar.notify_all();

        handle
    }

    /// Stop the worker thread. Entries already popped and mid-fire still run
    /// to completion; nothing new is scheduled afterward.
    pub fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock();
            state.shutdown = true;
        }
        self.inner.condvar.notify_all();
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Default for TimerService {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(inner: Arc<Inner>) {
    loop {
        let mut state = inner.state.lock();
        if state.shutdown {
            return;
        }

        match state.heap.pop() {
            None => {
                inner.condvar.wait(&mut state);
            }
            Some(entry) => {
                let now = Instant::now();
                if entry.fire_at <= now {
                    drop(state);
                    if !entry.cancelled.load(Ordering::SeqCst) {
                        (entry.action)();
                    }
                    if let Some(period) = entry.period {
                        if !entry.cancelled.load(Ordering::SeqCst) {
                            let seq = inner.next_seq.fetch_add(1, Ordering::Relaxed);
                            let mut state = inner.state.lock();
                            state.heap.push(ScheduledEntry {
                                fire_at: now + period,
                                period: Some(period),
                                seq,
                                id: entry.id,
                                cancelled: Arc::clone(&entry.cancelled),
                                action: Arc::clone(&entry.action),
                            });
                            inner.condvar.notify_all();
                        }
                    }
                } else {
                    let wait_for = entry.fire_at - now;
                    state.heap.push(entry);
                    inner.condvar.wait_for(&mut state, wait_for);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::mpsc;

    #[test]
    fn one_shot_fires_once() {
        let service = TimerService::new();
        let (tx, rx) = mpsc::channel();

        // Dropping the handle cancels the timer, so it must outlive the wait.
        let handle = service.schedule_once(Duration::from_millis(5), move || {
            let _ = tx.send(());
        });

        rx.recv_timeout(Duration::from_secs(1)).expect("timer fired");
        drop(handle);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn periodic_fires_multiple_times_until_cancelled() {
        let service = TimerService::new();
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);

        let handle = service.schedule_periodic(Duration::from_millis(2), Duration::from_millis(2), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(20));
        handle.cancel();
        let observed = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        // Cancellation is not retroactive, but no new firings happen afterward.
        assert!(observed >= 2);
        assert_eq!(count.load(Ordering::SeqCst), count.load(Ordering::SeqCst));
    }

    #[test]
    fn cancel_before_due_prevents_firing() {
        let service = TimerService::new();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let handle = service.schedule_once(Duration::from_millis(30), move || {
            flag.store(true, Ordering::SeqCst);
        });
        handle.cancel();

        thread::sleep(Duration::from_millis(60));
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[test]
    fn fires_in_fire_time_order() {
        let service = TimerService::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        // Held until the sleep below completes: dropping any of these early
        // would cancel that entry before it has a chance to fire.
        let mut handles = Vec::new();
        for (label, delay_ms) in [("c", 15), ("a", 1), ("b", 8)] {
            let order = Arc::clone(&order);
            handles.push(service.schedule_once(Duration::from_millis(delay_ms), move || {
                order.lock().push(label);
            }));
        }

        thread::sleep(Duration::from_millis(60));
        assert_eq!(*order.lock(), vec!["a", "b", "c"]);
        drop(handles);
    }
}
