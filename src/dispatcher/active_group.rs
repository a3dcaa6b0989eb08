//! Agents bound under the same group name share one worker thread and one
//! queue (like one-thread, but scoped per group); different groups run in
//! parallel.

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

struct Group {
    queue: Arc<DemandQueue>,
    agents: Arc<AgentTable>,
    worker: Option<JoinHandle<()>>,
    members: usize,
}

pub struct ActiveGroupDispatcher {
    lock_style: LockStyle,
    on_panic: Arc<dyn FailureHandler>,
    groups: Mutex<HashMap<String, Group>>,
    agent_group: Mutex<HashMap<AgentId, String>>,
}

impl ActiveGroupDispatcher {
    pub fn new(lock_style: LockStyle) -> Self {
        Self::with_failure_handler(lock_style, Arc::new(NoopFailureHandler))
    }

    pub fn with_failure_handler(lock_style: LockStyle, on_panic: Arc<dyn FailureHandler>) -> Self {
        Self {
            lock_style,
            on_panic,
            groups: Mutex::new(HashMap::new()),
            agent_group: Mutex::new(HashMap::new()),
        }
    }
}

impl Dispatcher for ActiveGroupDispatcher {
    fn bind(&self, request: BindRequest) -> Result<Arc<dyn DemandSink>, DispatcherError> {
        let Some(group_name) = request.group else {
            return Err(DispatcherError::BindingFailure {
                reason: "active-group dispatcher requires a group name".to_string(),
            });
        };

        let mut groups = self.groups.lock();
        let entry = groups.entry(group_name.clone()).or_insert_with(|| {
            let queue = Arc::new(DemandQueue::new(self.lock_style));
            let agents = Arc::new(AgentTable::new());
            let worker_queue = Arc::clone(&queue);
            let worker_agents = Arc::clone(&agents);
            let worker_services = Arc::clone(&request.services);
            let on_panic = Arc::clone(&self.on_panic);
            let handle = thread::spawn(move || {
                while let Some(demand) = worker_queue.pop_blocking() {
                    run_one(demand, &worker_agents, &worker_services, on_panic.as_ref());
                }
            });
            Group {
                queue,
                agents,
                worker: Some(handle),
                members: 0,
            }
        });

        entry.agents.insert(request.agent_id, request.agent);
        entry.members += 1;
        self.agent_group.lock().insert(request.agent_id, group_name);

        Ok(Arc::new(SharedQueueSink {
            queue: Arc::clone(&entry.queue),
        }))
    }

    fn unbind(&self, agent_id: AgentId) {
        let Some(group_name) = self.agent_group.lock().remove(&agent_id) else {
            return;
        };
        let mut groups = self.groups.lock();
        let Some(group) = groups.get_mut(&group_name) else {
            return;
        };
        group.agents.remove(agent_id);
        group.members -= 1;

        if group.members == 0 {
            if let Some(group) = groups.remove(&group_name) {
                group.queue.close();
                if let Some(handle) = group.worker {
                    let _ = handle.join();
                }
            }
        }
    }

    fn shutdown(&self) {
        let groups: Vec<Group> = self.groups.lock().drain().map(|(_, g)| g).collect();
        for group in &groups {
            group.queue.close();
        }
        for group in groups {
            if let Some(handle) = group.worker {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for ActiveGroupDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, AgentDefineError, DefineContext, EnvironmentServices};
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
        log: Arc<StdMutex<Vec<&'static str>>>,
        name: &'static str,
    }
    impl Agent for Recorder {
        fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
            Ok(())
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
    fn bind_without_group_name_is_rejected() {
        let dispatcher = ActiveGroupDispatcher::new(LockStyle::Mutex);
        let result = dispatcher.bind(BindRequest::new(AgentId::new(), Box::new(Recorder {
            log: Arc::new(StdMutex::new(Vec::new())),
            name: "a",
        }), Arc::new(NullServices)));
        assert!(matches!(result, Err(DispatcherError::BindingFailure { .. })));
    }

    #[test]
    fn agents_in_same_group_share_total_order() {
        let dispatcher = ActiveGroupDispatcher::new(LockStyle::Mutex);
        let log = Arc::new(StdMutex::new(Vec::new()));

        let mut sinks = Vec::new();
        let mut ids = Vec::new();
        let mut handlers = Vec::new();
        for name in ["a", "b"] {
            let id = AgentId::new();
            let recorder = Recorder {
                log: Arc::clone(&log),
                name,
            };
            let handler: crate::demand::Handler = Arc::new(move |agent_dyn, _msg, _ctx| {
                if let Some(recorder) = agent_dyn.as_any_mut().downcast_mut::<Recorder>() {
                    recorder.log.lock().expect("lock").push(recorder.name);
                }
            });
            let sink = dispatcher
                .bind(
                    BindRequest::new(id, Box::new(recorder), Arc::new(NullServices)).with_group("workers"),
                )
                .expect("bind");
            sinks.push(sink);
            ids.push(id);
            handlers.push(handler);
        }

        for i in 0..2 {
            sinks[i].enqueue(Demand::new(Arc::new(MessageEnvelope::new(Ping)), ids[i], Arc::clone(&handlers[i])));
        }

        dispatcher.shutdown();
        assert_eq!(*log.lock().expect("lock"), vec!["a", "b"]);
    }
}
