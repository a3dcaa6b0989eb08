//! The live agent instances a dispatcher owns, keyed by id.
//!
//! Kept separate from the demand queues themselves: a worker thread looks an
//! agent up here immediately before running a demand against it, so an
//! `unbind` that races a still-queued demand is observed as "agent missing"
//! rather than a dangling reference — matching the spec's discard-on-unbind
//! semantics instead of requiring the queue to be purged synchronously.

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::{Mutex, RwLock};

// Layer 3: Internal module imports
use crate::agent::Agent;
use crate::util::AgentId;

#[derive(Default)]
pub(crate) struct AgentTable {
    agents: RwLock<HashMap<AgentId, Arc<Mutex<Box<dyn Agent>>>>>,
}

impl AgentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: AgentId, agent: Box<dyn Agent>) {
        self.agents.write().insert(id, Arc::new(Mutex::new(agent)));
    }

    pub fn get(&self, id: AgentId) -> Option<Arc<Mutex<Box<dyn Agent>>>> {
        self.agents.read().get(&id).cloned()
    }

    pub fn remove(&self, id: AgentId) -> Option<Arc<Mutex<Box<dyn Agent>>>> {
        self.agents.write().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.agents.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentDefineError;
    use crate::agent::DefineContext;

    struct Noop;
    impl Agent for Noop {
        fn define(&mut self, _ctx: &mut DefineContext) -> Result<(), AgentDefineError> {
            Ok(())
        }
    }

    #[test]
    fn insert_then_get_round_trips() {
        let table = AgentTable::new();
        let id = AgentId::new();
        table.insert(id, Box::new(Noop));
        assert!(table.get(id).is_some());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_makes_subsequent_lookups_miss() {
        let table = AgentTable::new();
        let id = AgentId::new();
        table.insert(id, Box::new(Noop));
        table.remove(id);
        assert!(table.get(id).is_none());
    }
}
