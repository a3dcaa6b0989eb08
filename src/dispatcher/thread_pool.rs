//! A fixed pool of worker threads, one demand queue per cooperation.
//!
//! Workers pull whole cooperation queues off a shared ready set rather than
//! individual demands, and drain at most `max_demands_at_once` from a queue
//! before rotating it back — this is what gives cooperation-FIFO ordering
//! (all demands of one cooperation are only ever in flight on one worker at
//! a time) while still spreading distinct cooperations across the pool, and
//! the rotation bound keeps one busy cooperation from starving the others.

// Layer 1: Standard library imports
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

// Layer 2: Third-party crate imports
use parking_lot::{Condvar, Mutex};

// Layer 3: Internal module imports
use super::agent_table::AgentTable;
use super::errors::DispatcherError;
use super::failure::{FailureHandler, NoopFailureHandler};
use super::handle::{BindRequest, Dispatcher};
use super::queue::{DemandQueue, LockStyle};
use super::worker::run_one;
use crate::agent::EnvironmentServices;
use crate::demand::Demand;
use crate::mailbox::DemandSink;
use crate::util::{AgentId, CooperationId};

/// Fairness knob: caps how many demands a worker drains from one
/// cooperation's queue before rotating it back to the ready set.
#[derive(Debug, Clone, Copy)]
pub struct ThreadPoolParams {
    pub worker_count: usize,
    pub max_demands_at_once: usize,
}

impl Default for ThreadPoolParams {
    fn default() -> Self {
        Self {
            worker_count: 4,
            max_demands_at_once: 16,
        }
    }
}

struct CoopState {
    queue: DemandQueue,
    agents: AgentTable,
    in_ready: AtomicBool,
}

struct ReadySet {
    queue: Mutex<VecDeque<CooperationId>>,
    available: Condvar,
}

impl ReadySet {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    fn push(&self, id: CooperationId) {
        self.queue.lock().push_back(id);
        self.available.notify_one();
    }

    fn pop_blocking(&self, shutdown: &AtomicBool) -> Option<CooperationId> {
        let mut guard = self.queue.lock();
        loop {
            if let Some(id) = guard.pop_front() {
                return Some(id);
            }
            if shutdown.load(Ordering::SeqCst) {
                return None;
            }
            self.available.wait(&mut guard);
        }
    }

    fn wake_all(&self) {
        self.available.notify_all();
    }
}

struct CoopSink {
    coop: Arc<CoopState>,
    coop_id: CooperationId,
    ready: Arc<ReadySet>,
}

impl DemandSink for CoopSink {
    fn enqueue(&self, demand: Demand) {
        self.coop.queue.push(demand);
        if !self.coop.in_ready.swap(true, Ordering::SeqCst) {
            self.ready.push(self.coop_id);
        }
    }
}

pub struct ThreadPoolDispatcher {
    params: ThreadPoolParams,
    coops: Arc<Mutex<HashMap<CooperationId, Arc<CoopState>>>>,
    coop_members: Mutex<HashMap<CooperationId, usize>>,
    ready: Arc<ReadySet>,
    shutdown: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPoolDispatcher {
    pub fn new(params: ThreadPoolParams, services: Arc<dyn EnvironmentServices>) -> Self {
        Self::with_failure_handler(params, services, Arc::new(NoopFailureHandler))
    }

    pub fn with_failure_handler(
        params: ThreadPoolParams,
        services: Arc<dyn EnvironmentServices>,
        on_panic: Arc<dyn FailureHandler>,
    ) -> Self {
        let coops: Arc<Mutex<HashMap<CooperationId, Arc<CoopState>>>> = Arc::new(Mutex::new(HashMap::new()));
        let ready = Arc::new(ReadySet::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(params.worker_count);
        for _ in 0..params.worker_count {
            let coops = Arc::clone(&coops);
            let ready = Arc::clone(&ready);
            let shutdown = Arc::clone(&shutdown);
            let services = Arc::clone(&services);
            let on_panic = Arc::clone(&on_panic);
            let max_demands_at_once = params.max_demands_at_once;
            workers.push(thread::spawn(move || {
                while let Some(coop_id) = ready.pop_blocking(&shutdown) {
                    let Some(coop) = coops.lock().get(&coop_id).cloned() else {
                        continue;
                    };
                    let batch = coop.queue.pop_up_to(max_demands_at_once);
                    for demand in batch {
                        run_one(demand, &coop.agents, &services, on_panic.as_ref());
                    }
                    if coop.queue.is_empty() {
                        coop.in_ready.store(false, Ordering::SeqCst);
                        if !coop.queue.is_empty() && !coop.in_ready.swap(true, Ordering::SeqCst) {
                            ready.push(coop_id);
                        }
                    } else {
                        ready.push(coop_id);
                    }
                }
            }));
        }

        Self {
            params,
            coops,
            coop_members: Mutex::new(HashMap::new()),
            ready,
            shutdown,
            workers: Mutex::new(workers),
        }
    }

    pub fn params(&self) -> ThreadPoolParams {
        self.params
    }
}

impl Dispatcher for ThreadPoolDispatcher {
    fn bind(&self, request: BindRequest) -> Result<Arc<dyn DemandSink>, DispatcherError> {
        let Some(cooperation) = request.cooperation else {
            return Err(DispatcherError::BindingFailure {
                reason: "thread-pool dispatcher requires a cooperation id".to_string(),
            });
        };

        let mut coops = self.coops.lock();
        let coop = coops.entry(cooperation).or_insert_with(|| {
            Arc::new(CoopState {
                queue: DemandQueue::new(LockStyle::Mutex),
                agents: AgentTable::new(),
                in_ready: AtomicBool::new(false),
            })
        });
        coop.agents.insert(request.agent_id, request.agent);
        *self.coop_members.lock().entry(cooperation).or_insert(0) += 1;

        Ok(Arc::new(CoopSink {
            coop: Arc::clone(coop),
            coop_id: cooperation,
            ready: Arc::clone(&self.ready),
        }))
    }

    fn unbind(&self, agent_id: AgentId) {
        let coops = self.coops.lock();
        for (coop_id, coop) in coops.iter() {
            if coop.agents.get(agent_id).is_some() {
                coop.agents.remove(agent_id);
                let mut members = self.coop_members.lock();
                if let Some(count) = members.get_mut(coop_id) {
                    *count = count.saturating_sub(1);
                }
                break;
            }
        }
    }

    fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        self.ready.wake_all();
        let workers: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
        for worker in workers {
            let _ = worker.join();
        }
    }
}

impl Drop for ThreadPoolDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
