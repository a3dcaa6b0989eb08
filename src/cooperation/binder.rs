//! Binds an agent to a dispatcher: the seam between "here is an agent" and
//! "here is the thread this agent's handlers will actually run on".

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use crate::agent::{Agent, EnvironmentServices};
use crate::dispatcher::{BindRequest, Dispatcher, DispatcherError};
use crate::mailbox::DemandSink;
use crate::util::{AgentId, CooperationId};

/// A dispatcher handle plus whatever routing hints that dispatcher's
/// strategy needs at bind time (a group name for `active-group`, nothing for
/// the others — `cooperation` is supplied separately at bind time since it
/// comes from the cooperation doing the binding, not the binder itself).
///
/// Cheap to clone: cloning shares the same underlying dispatcher.
#[derive(Clone)]
pub struct Binder {
    dispatcher: Arc<dyn Dispatcher>,
    group: Option<String>,
}

impl Binder {
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self { dispatcher, group: None }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub(crate) fn bind(
        &self,
        agent_id: AgentId,
        agent: Box<dyn Agent>,
        services: Arc<dyn EnvironmentServices>,
        cooperation: CooperationId,
    ) -> Result<Arc<dyn DemandSink>, DispatcherError> {
        let mut request = BindRequest::new(agent_id, agent, services).with_cooperation(cooperation);
        if let Some(group) = &self.group {
            request = request.with_group(group.clone());
        }
        self.dispatcher.bind(request)
    }

    pub(crate) fn unbind(&self, agent_id: AgentId) {
        self.dispatcher.unbind(agent_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentDefineError, DefineContext};
    use crate::dispatcher::{LockStyle, OneThreadDispatcher};
    use crate::mailbox::Mailbox;
    use crate::message::MessageEnvelope;
    use crate::timer::TimerHandle;
    use std::time::Duration;

    struct Noop;
    impl Agent for Noop {
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
    fn bind_then_unbind_round_trips_through_the_dispatcher() {
        let binder = Binder::new(Arc::new(OneThreadDispatcher::new(Arc::new(NullServices), LockStyle::Mutex)));
        let agent_id = AgentId::new();

        let sink = binder
            .bind(agent_id, Box::new(Noop), Arc::new(NullServices), CooperationId::new())
            .expect("bind");
        drop(sink);

        binder.unbind(agent_id);
    }
}
