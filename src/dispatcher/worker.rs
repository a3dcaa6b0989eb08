//! The demand-execution step shared by every dispatcher strategy's worker
//! threads: look the target agent up, run its handler, catch panics.

// Layer 1: Standard library imports
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use super::agent_table::AgentTable;
use super::failure::FailureHandler;
use crate::agent::{AgentContext, EnvironmentServices};
use crate::demand::Demand;

/// Run one demand against `agents`. Discards it silently if the target agent
/// has already been unbound (spec: demands queued before an unbind either
/// run on a still-bound agent or are discarded once the worker observes the
/// unbinding). Catches a panicking handler and reports it via `on_panic`
/// rather than letting it unwind the worker thread.
pub(crate) fn run_one(
    demand: Demand,
    agents: &AgentTable,
    services: &Arc<dyn EnvironmentServices>,
    on_panic: &dyn FailureHandler,
) {
    let Some(slot) = agents.get(demand.agent) else {
        return;
    };
    let mut agent = slot.lock();
    let mut ctx = AgentContext::new(demand.agent, Arc::clone(services));

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        demand.execute(&mut **agent, &mut ctx);
    }));

    if let Err(payload) = outcome {
        on_panic.on_handler_panic(demand.agent, payload);
    }
}
