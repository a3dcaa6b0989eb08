//! A single worker thread servicing a single shared queue for every agent
//! bound to this dispatcher: total order across the whole dispatcher, no
//! parallelism between bound agents.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
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
use crate::agent::EnvironmentServices;
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

/// The single-worker-thread dispatcher strategy.
pub struct OneThreadDispatcher {
    queue: Arc<DemandQueue>,
    agents: Arc<AgentTable>,
    shutdown: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl OneThreadDispatcher {
    pub fn new(services: Arc<dyn EnvironmentServices>, lock_style: LockStyle) -> Self {
        Self::with_failure_handler(services, lock_style, Arc::new(NoopFailureHandler))
    }

    pub fn with_failure_handler(
        services: Arc<dyn EnvironmentServices>,
        lock_style: LockStyle,
        on_panic: Arc<dyn FailureHandler>,
    ) -> Self {
        let queue = Arc::new(DemandQueue::new(lock_style));
        let agents = Arc::new(AgentTable::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker_queue = Arc::clone(&queue);
        let worker_agents = Arc::clone(&agents);
        let worker_services = services;
        let worker_on_panic = on_panic;
        let handle = thread::spawn(move || {
            while let Some(demand) = worker_queue.pop_blocking() {
                run_one(demand, &worker_agents, &worker_services, worker_on_panic.as_ref());
            }
        });

        Self {
            queue,
            agents,
            shutdown,
            worker: Mutex::new(Some(handle)),
        }
    }
}

impl Dispatcher for OneThreadDispatcher {
    fn bind(&self, request: BindRequest) -> Result<Arc<dyn DemandSink>, DispatcherError> {
        self.agents.insert(request.agent_id, request.agent);
        Ok(Arc::new(SharedQueueSink {
            queue: Arc::clone(&self.queue),
        }))
    }

    fn unbind(&self, agent_id: AgentId) {
        self.agents.remove(agent_id);
    }

    fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        self.queue.close();
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for OneThreadDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, AgentContext as Ctx, AgentDefineError, DefineContext};
    use crate::mailbox::Mailbox;
    use crate::message::{Message, MessageEnvelope};
    use crate::timer::TimerHandle;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    #[derive(Debug, Clone)]
    struct Ping;
    impl Message for Ping {
        const MESSAGE_TYPE: &'static str = "ping";
    }

    struct Recorder {
        log: Arc<StdMutex<Vec<u32>>>,
        tag: u32,
    }
    impl Agent for Recorder {
        fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
            Ok(())
        }
    }
    impl Recorder {
        fn on_ping(&mut self, _msg: &Ping, _ctx: &mut Ctx) {
            self.log.lock().expect("lock").push(self.tag);
        }
    }

    struct NullServices;
    impl EnvironmentServices for NullServices {
        fn send(&self, _t: &Mailbox, _e: MessageEnvelope) {}
        fn send_delayed(&self, _t: &Mailbox, _e: MessageEnvelope, _d: Duration) -> TimerHandle {
            TimerHandle::inert()
        }
        fn send_periodic(&self, _t: &Mailbox, _e: MessageEnvelope, _i: Duration, _p: Duration) -> TimerHandle {
            TimerHandle::inert()
        }
        fn mailbox_by_name(&self, _n: &str) -> Option<Mailbox> {
            None
        }
        fn mailbox_by_id(&self, _id: u64) -> Option<Mailbox> {
            None
        }
    }

    #[test]
    fn total_order_is_preserved_across_distinct_agents() {
        let dispatcher = OneThreadDispatcher::new(Arc::new(NullServices), LockStyle::Mutex);
        let log = Arc::new(StdMutex::new(Vec::new()));

        let mut handlers: Vec<crate::demand::Handler> = Vec::new();
        let mut sinks = Vec::new();
        let mut agent_ids = Vec::new();
        for tag in 0..3u32 {
            let agent_id = AgentId::new();
            let recorder = Recorder {
                log: Arc::clone(&log),
                tag,
            };
            let handler: crate::demand::Handler = Arc::new(move |agent_dyn, msg, ctx| {
                if let Some(recorder) = agent_dyn.as_any_mut().downcast_mut::<Recorder>() {
                    if let Some(ping) = msg.downcast::<Ping>() {
                        recorder.on_ping(ping, ctx);
                    }
                }
            });
            let sink = dispatcher
                .bind(BindRequest::new(agent_id, Box::new(recorder), Arc::new(NullServices)))
                .expect("bind");
            handlers.push(handler);
            sinks.push(sink);
            agent_ids.push(agent_id);
        }

        for i in 0..3 {
            let envelope = Arc::new(MessageEnvelope::new(Ping));
            let demand = Demand::new(envelope, agent_ids[i], Arc::clone(&handlers[i]));
            sinks[i].enqueue(demand);
        }

        dispatcher.shutdown();
        assert_eq!(*log.lock().expect("lock"), vec![0, 1, 2]);
    }

    #[test]
    fn demand_for_unbound_agent_is_discarded() {
        let dispatcher = OneThreadDispatcher::new(Arc::new(NullServices), LockStyle::Mutex);
        let agent_id = AgentId::new();
        let log = Arc::new(StdMutex::new(Vec::new()));
        let recorder = Recorder {
            log: Arc::clone(&log),
            tag: 7,
        };
        let handler: crate::demand::Handler = Arc::new(move |agent_dyn, msg, ctx| {
            if let Some(recorder) = agent_dyn.as_any_mut().downcast_mut::<Recorder>() {
                if let Some(ping) = msg.downcast::<Ping>() {
                    recorder.on_ping(ping, ctx);
                }
            }
        });
        let sink = dispatcher
            .bind(BindRequest::new(agent_id, Box::new(recorder), Arc::new(NullServices)))
            .expect("bind");

        dispatcher.unbind(agent_id);
        sink.enqueue(Demand::new(Arc::new(MessageEnvelope::new(Ping)), agent_id, handler));

        dispatcher.shutdown();
        assert!(log.lock().expect("lock").is_empty());
    }
}
