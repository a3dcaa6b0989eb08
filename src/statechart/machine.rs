//! Hierarchical state-chart: entry/exit actions, per-state scoped event
//! subscriptions, message-triggered transitions, and least-common-ancestor
//! transition logic.

// Layer 1: Standard library imports
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use super::state::StateId;
use crate::agent::{Agent, AgentContext};
use crate::mailbox::Mailbox;
use crate::message::{Message, MessageType};

type Action<A> = Box<dyn Fn(&mut A, &mut AgentContext) + Send + Sync>;
type EventAction = Arc<dyn Fn(&mut dyn Agent, &dyn Any, &mut AgentContext) + Send + Sync>;

/// What a matching (mailbox, message type) pair does while a given state is
/// in the active configuration: either run a handler scoped to that state, or
/// transition elsewhere and re-dispatch the same message there.
enum EventOutcome {
    Handle(EventAction),
    Transfer(StateId),
}

impl Clone for EventOutcome {
    fn clone(&self) -> Self {
        match self {
            Self::Handle(action) => Self::Handle(Arc::clone(action)),
            Self::Transfer(target) => Self::Transfer(*target),
        }
    }
}

struct StateNode<A: Agent> {
    #[allow(dead_code)]
    name: String,
    parent: Option<StateId>,
    on_entry: Option<Action<A>>,
    on_exit: Option<Action<A>>,
    events: HashMap<(u64, MessageType), EventOutcome>,
}

/// A hierarchical state-chart owned by a single agent type `A`.
///
/// A transition between any two states exits every state between the
/// current leaf and their least common ancestor (leaf-to-root order), then
/// enters every state between that ancestor and the target (root-to-leaf
/// order) — the two paths never overlap, so an ancestor shared by both
/// states is neither exited nor re-entered.
///
/// Per-state subscriptions registered with [`StateMachine::event`] are only
/// reachable while their state is in the active configuration: [`dispatch`]
/// walks from the current leaf up to the root and applies the first match,
/// mirroring the "active only while in this state" contract an installed
/// and later removed mailbox subscription would give, without the runtime
/// actually subscribing and unsubscribing a mailbox on every transition.
///
/// [`dispatch`]: StateMachine::dispatch
///
/// # Example
/// ```rust
/// use agentbeam::statechart::StateMachine;
/// use agentbeam::agent::{Agent, AgentContext, DefineContext, AgentDefineError};
///
/// struct Door;
/// impl Agent for Door {
///     fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
///         Ok(())
///     }
/// }
///
/// let mut machine = StateMachine::<Door>::new();
/// let closed = machine.add_state("closed", None);
/// let locked = machine.add_state("locked", Some(closed));
/// let unlocked = machine.add_state("unlocked", Some(closed));
/// let open = machine.add_state("open", None);
///
/// assert!(machine.is_ancestor_of(closed, locked));
/// assert!(!machine.is_ancestor_of(open, locked));
/// let _ = unlocked;
/// ```
pub struct StateMachine<A: Agent> {
    nodes: Vec<StateNode<A>>,
    active: Option<StateId>,
}

impl<A: Agent> StateMachine<A> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            active: None,
        }
    }

    /// Register a new state, optionally nested under `parent`.
    pub fn add_state(&mut self, name: impl Into<String>, parent: Option<StateId>) -> StateId {
        let id = StateId(self.nodes.len());
        self.nodes.push(StateNode {
            name: name.into(),
            parent,
            on_entry: None,
            on_exit: None,
            events: HashMap::new(),
        });
        id
    }

    pub fn on_entry(&mut self, state: StateId, action: impl Fn(&mut A, &mut AgentContext) + Send + Sync + 'static) {
        self.nodes[state.0].on_entry = Some(Box::new(action));
    }

    pub fn on_exit(&mut self, state: StateId, action: impl Fn(&mut A, &mut AgentContext) + Send + Sync + 'static) {
        self.nodes[state.0].on_exit = Some(Box::new(action));
    }

    /// Register `handler` for messages of type `M` arriving on `mailbox`,
    /// active only while `state` is in the configuration.
    pub fn event<M, F>(&mut self, state: StateId, mailbox: &Mailbox, handler: F)
    where
        M: Message,
        F: Fn(&mut A, &M, &mut AgentContext) + Send + Sync + 'static,
    {
        let boxed: EventAction = Arc::new(move |agent_dyn, message_dyn, ctx| {
            if let Some(agent) = agent_dyn.as_any_mut().downcast_mut::<A>() {
                if let Some(message) = message_dyn.downcast_ref::<M>() {
                    handler(agent, message, ctx);
                }
            }
        });
        let key = (mailbox.address().id(), MessageType::of::<M>());
        self.nodes[state.0].events.insert(key, EventOutcome::Handle(boxed));
    }

    /// Declare that a message of type `M` arriving on `mailbox` while `state`
    /// is active transitions to `target` and is re-dispatched there.
    pub fn transfer_on<M: Message>(&mut self, state: StateId, mailbox: &Mailbox, target: StateId) {
        let key = (mailbox.address().id(), MessageType::of::<M>());
        self.nodes[state.0].events.insert(key, EventOutcome::Transfer(target));
    }

    pub fn active(&self) -> Option<StateId> {
        self.active
    }

    /// `state` itself, then its parent, grandparent, and so on up to the root.
    fn ancestor_chain(&self, state: StateId) -> Vec<StateId> {
        let mut chain = vec![state];
        let mut current = state;
        while let Some(parent) = self.nodes[current.0].parent {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Whether `ancestor` is `descendant` itself or one of its ancestors.
    pub fn is_ancestor_of(&self, ancestor: StateId, descendant: StateId) -> bool {
        self.ancestor_chain(descendant).contains(&ancestor)
    }

    /// Whether the currently active state is `state` or nested under it.
    pub fn is_active_within(&self, state: StateId) -> bool {
        match self.active {
            Some(active) => self.is_ancestor_of(state, active),
            None => false,
        }
    }

    /// Route `message` received on `mailbox` to whichever ancestor of the
    /// current leaf (closest first) has a matching [`event`] handler or
    /// [`transfer_on`] transition. Returns whether anything matched; a
    /// message with no match anywhere up to the root is dropped silently,
    /// per the state-chart's handler-lookup contract.
    ///
    /// [`event`]: StateMachine::event
    /// [`transfer_on`]: StateMachine::transfer_on
    pub fn dispatch<M: Message>(&mut self, agent: &mut A, ctx: &mut AgentContext, mailbox: &Mailbox, message: &M) -> bool {
        let Some(leaf) = self.active else {
            return false;
        };
        let key = (mailbox.address().id(), MessageType::of::<M>());
        let chain = self.ancestor_chain(leaf);

        let mut found = None;
        for state in &chain {
            if let Some(outcome) = self.nodes[state.0].events.get(&key) {
                found = Some(outcome.clone());
                break;
            }
        }

        match found {
            Some(EventOutcome::Handle(handler)) => {
                handler(agent as &mut dyn Agent, message as &dyn Any, ctx);
                true
            }
            Some(EventOutcome::Transfer(target)) => {
                self.transfer_to(agent, ctx, target);
                self.dispatch(agent, ctx, mailbox, message)
            }
            None => false,
        }
    }

    /// Transition to `target`, running exit actions from the current state up
    /// to (but not including) the least common ancestor, then entry actions
    /// from there down to `target`.
    pub fn transfer_to(&mut self, agent: &mut A, ctx: &mut AgentContext, target: StateId) {
        let (exit_path, enter_path) = self.transition_path(self.active, target);

        for state in exit_path {
            if let Some(action) = &self.nodes[state.0].on_exit {
                action(agent, ctx);
            }
        }
        for state in enter_path {
            if let Some(action) = &self.nodes[state.0].on_entry {
                action(agent, ctx);
            }
        }

        self.active = Some(target);
        ctx.set_active_state(Some(target));
    }

    fn transition_path(&self, from: Option<StateId>, to: StateId) -> (Vec<StateId>, Vec<StateId>) {
        let to_chain = self.ancestor_chain(to); // leaf .. root

        let Some(from) = from else {
            return (Vec::new(), to_chain.into_iter().rev().collect());
        };

        let from_chain = self.ancestor_chain(from); // leaf .. root
        let to_set: HashSet<StateId> = to_chain.iter().copied().collect();
        let lca = from_chain.iter().find(|s| to_set.contains(s)).copied();

        let exit_path: Vec<StateId> = from_chain
            .into_iter()
            .take_while(|s| Some(*s) != lca)
            .collect();
        let enter_path: Vec<StateId> = to_chain
            .into_iter()
            .take_while(|s| Some(*s) != lca)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        (exit_path, enter_path)
    }
}

impl<A: Agent> Default for StateMachine<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::traits::AgentDefineError;
    use crate::agent::{AgentContext, DefineContext};
    use crate::mailbox::Mailbox;
    use crate::message::MessageEnvelope;
    use crate::timer::TimerHandle;
    use crate::util::{AgentId, MailboxAddress};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct Door;
    impl Agent for Door {
        fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
            Ok(())
        }
    }

    struct NullServices;
    impl crate::agent::context::EnvironmentServices for NullServices {
        fn send(&self, _target: &Mailbox, _envelope: MessageEnvelope) {}
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

    fn test_ctx() -> AgentContext {
        AgentContext::new(AgentId::new(), Arc::new(NullServices))
    }

    #[test]
    fn transitions_within_same_parent_do_not_exit_parent() {
        let mut machine = StateMachine::<Door>::new();
        let closed = machine.add_state("closed", None);
        let locked = machine.add_state("locked", Some(closed));
        let unlocked = machine.add_state("unlocked", Some(closed));

        let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        let log_entry = Arc::clone(&log);
        let log_exit = Arc::clone(&log);
        machine.on_exit(closed, move |_a, _c| log_exit.lock().expect("lock").push("exit closed"));
        machine.on_entry(unlocked, move |_a, _c| log_entry.lock().expect("lock").push("enter unlocked"));

        let mut door = Door;
        let mut ctx = test_ctx();
        machine.transfer_to(&mut door, &mut ctx, locked);
        machine.transfer_to(&mut door, &mut ctx, unlocked);

        assert_eq!(*log.lock().expect("lock"), vec!["enter unlocked"]);
        assert_eq!(machine.active(), Some(unlocked));
    }

    #[test]
    fn unrelated_states_exit_and_enter_fully() {
        let mut machine = StateMachine::<Door>::new();
        let closed = machine.add_state("closed", None);
        let locked = machine.add_state("locked", Some(closed));
        let open = machine.add_state("open", None);

        let mut door = Door;
        let mut ctx = test_ctx();
        machine.transfer_to(&mut door, &mut ctx, locked);
        machine.transfer_to(&mut door, &mut ctx, open);

        assert_eq!(machine.active(), Some(open));
        assert!(!machine.is_active_within(closed));
    }

    #[test]
    fn is_active_within_covers_ancestors() {
        let mut machine = StateMachine::<Door>::new();
        let closed = machine.add_state("closed", None);
        let locked = machine.add_state("locked", Some(closed));

        let mut door = Door;
        let mut ctx = test_ctx();
        machine.transfer_to(&mut door, &mut ctx, locked);

        assert!(machine.is_active_within(closed));
        assert!(machine.is_active_within(locked));
    }

    #[derive(Debug, Clone)]
    struct Knock;
    impl Message for Knock {
        const MESSAGE_TYPE: &'static str = "knock";
    }

    #[test]
    fn event_handler_only_fires_while_its_state_is_active() {
        let mailbox = Mailbox::new(MailboxAddress::named("door-events"));
        let mut machine = StateMachine::<Door>::new();
        let closed = machine.add_state("closed", None);
        let locked = machine.add_state("locked", Some(closed));
        let open = machine.add_state("open", None);

        let knocks = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&knocks);
        machine.event::<Knock, _>(locked, &mailbox, move |_door, _msg, _ctx| {
            *counter.lock().expect("lock") += 1;
        });

        let mut door = Door;
        let mut ctx = test_ctx();
        machine.transfer_to(&mut door, &mut ctx, locked);
        assert!(machine.dispatch(&mut door, &mut ctx, &mailbox, &Knock));
        assert_eq!(*knocks.lock().expect("lock"), 1);

        machine.transfer_to(&mut door, &mut ctx, open);
        assert!(!machine.dispatch(&mut door, &mut ctx, &mailbox, &Knock));
        assert_eq!(*knocks.lock().expect("lock"), 1);
    }

    #[test]
    fn transfer_on_moves_state_and_redispatches_the_message() {
        let mailbox = Mailbox::new(MailboxAddress::named("door-events"));
        let mut machine = StateMachine::<Door>::new();
        let closed = machine.add_state("closed", None);
        let open = machine.add_state("open", None);

        let opened = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&opened);
        machine.transfer_on::<Knock>(closed, &mailbox, open);
        machine.event::<Knock, _>(open, &mailbox, move |_door, _msg, _ctx| {
            *counter.lock().expect("lock") += 1;
        });

        let mut door = Door;
        let mut ctx = test_ctx();
        machine.transfer_to(&mut door, &mut ctx, closed);

        assert!(machine.dispatch(&mut door, &mut ctx, &mailbox, &Knock));
        assert_eq!(machine.active(), Some(open));
        assert_eq!(*opened.lock().expect("lock"), 1);
    }

    #[test]
    fn event_lookup_walks_up_to_an_ancestor_state() {
        let mailbox = Mailbox::new(MailboxAddress::named("door-events"));
        let mut machine = StateMachine::<Door>::new();
        let closed = machine.add_state("closed", None);
        let locked = machine.add_state("locked", Some(closed));

        let knocks = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&knocks);
        machine.event::<Knock, _>(closed, &mailbox, move |_door, _msg, _ctx| {
            *counter.lock().expect("lock") += 1;
        });

        let mut door = Door;
        let mut ctx = test_ctx();
        machine.transfer_to(&mut door, &mut ctx, locked);

        assert!(machine.dispatch(&mut door, &mut ctx, &mailbox, &Knock));
        assert_eq!(*knocks.lock().expect("lock"), 1);
    }

    #[test]
    fn dispatch_with_no_active_state_drops_silently() {
        let mailbox = Mailbox::new(MailboxAddress::named("door-events"));
        let mut machine = StateMachine::<Door>::new();
        let mut door = Door;
        let mut ctx = test_ctx();
        assert!(!machine.dispatch(&mut door, &mut ctx, &mailbox, &Knock));
    }
}
