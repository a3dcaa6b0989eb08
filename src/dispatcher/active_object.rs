//! One dedicated worker thread and queue per bound agent: full parallelism
//! between agents, per-agent order still guaranteed since each agent has
//! exactly one thread running its demands.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

// Layer 2: Third-party crate imports
use parking_lot::Mutex;

// Layer 3: Internal module imports
use super::agent_table::AgentTable;
use super::errors::DispatcherError;
use super::failure::{FailureHandler, NoopFailureHandler};
use super::handle::{BindRequest, Dispatcher};
use super::queue::{DemandQueue, LockStyle};
use super::worker::run_one;
use crate::demand::Demand;
use crate::mailbox::DemandSink;
use crate::util::AgentId;

struct SharedQueueSink {
    queue: Arc<DemandQueue>,
}

impl DemandSink for SharedQueueSink {
    fn enqueue(&self, demand: Demand) {
        self.queue.push(demand);
    }
}

struct Worker {
    queue: Arc<DemandQueue>,
    handle: JoinHandle<()>,
}

pub struct ActiveObjectDispatcher {
    lock_style: LockStyle,
    on_panic: Arc<dyn FailureHandler>,
    workers: Mutex<HashMap<AgentId, Worker>>,
}

impl ActiveObjectDispatcher {
    pub fn new(lock_style: LockStyle) -> Self {
        Self::with_failure_handler(lock_style, Arc::new(NoopFailureHandler))
    }

    pub fn with_failure_handler(lock_style: LockStyle, on_panic: Arc<dyn FailureHandler>) -> Self {
        Self {
            lock_style,
            on_panic,
            workers: Mutex::new(HashMap::new()),
        }
    }
}

impl Dispatcher for ActiveObjectDispatcher {
    fn bind(&self, request: BindRequest) -> Result<Arc<dyn DemandSink>, DispatcherError> {
        let agents = Arc::new(AgentTable::new());
        agents.insert(request.agent_id, request.agent);

        let queue = Arc::new(DemandQueue::new(self.lock_style));
        let worker_queue = Arc::clone(&queue);
        let services = request.services;
        let on_panic = Arc::clone(&self.on_panic);
        let handle = thread::spawn(move || {
            while let Some(demand) = worker_queue.pop_blocking() {
                run_one(demand, &agents, &services, on_panic.as_ref());
            }
        });

        self.workers.lock().insert(request.agent_id, Worker { queue: Arc::clone(&queue), handle });
        Ok(Arc::new(SharedQueueSink { queue }))
    }

    fn unbind(&self, agent_id: AgentId) {
        if let Some(worker) = self.workers.lock().remove(&agent_id) {
            worker.queue.close();
            let _ = worker.handle.join();
        }
    }

    fn shutdown(&self) {
        let workers: Vec<Worker> = self.workers.lock().drain().map(|(_, w)| w).collect();
        for worker in &workers {
            worker.queue.close();
        }
        for worker in workers {
            let _ = worker.handle.join();
        }
    }
}

impl Drop for ActiveObjectDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}
