// Layer 1: Standard library imports
// (none beyond chrono)

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc}; // §3.2 MANDATORY

// Layer 3: Internal module imports
// (none)

/// Agent lifecycle state.
///
/// `Defining -> Bound -> Running -> Deregistering -> Deregistered`. An agent
/// moves through `Defining` and `Bound` once, synchronously, during its
/// cooperation's registration transaction; it then stays `Running` until its
/// cooperation (or the agent itself) initiates deregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// `define()` is executing: subscriptions are being recorded.
    Defining,
    /// `define()` returned successfully; bound into the cooperation but
    /// `on_start` has not yet run.
    Bound,
    /// `on_start` completed; the agent may receive demands.
    Running,
    /// Deregistration has begun: no new demands are being enqueued, but
    /// already-queued ones may still drain depending on the dispatcher.
    Deregistering,
    /// `on_finish` completed; the agent no longer exists in its cooperation.
    Deregistered,
}

impl AgentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deregistered)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Tracks an agent's current state, the time of its last transition, and how
/// many times it has been restarted by its cooperation's `restart-agent`
/// exception reaction.
///
/// # Example
/// ```rust
/// use agentbeam::agent::{AgentLifecycle, AgentState};
///
/// let mut lifecycle = AgentLifecycle::new();
/// assert_eq!(lifecycle.state(), AgentState::Defining);
///
/// lifecycle.transition_to(AgentState::Bound);
/// lifecycle.transition_to(AgentState::Running);
/// assert!(lifecycle.state().is_running());
/// ```
#[derive(Debug, Clone)]
pub struct AgentLifecycle {
    state: AgentState,
    last_state_change: DateTime<Utc>,
    restart_count: u32,
}

impl AgentLifecycle {
    pub fn new() -> Self {
        Self {
            state: AgentState::Defining,
            last_state_change: Utc::now(),
            restart_count: 0,
        }
    }

    pub fn transition_to(&mut self, new_state: AgentState) {
        self.state = new_state;
        self.last_state_change = Utc::now();
    }

    /// Record a restart (the `restart-agent` exception reaction fired) and
    /// transition back to `Bound` ahead of a fresh `on_start`.
    pub fn record_restart(&mut self) {
        self.restart_count += 1;
        self.transition_to(AgentState::Bound);
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn last_state_change(&self) -> DateTime<Utc> {
        self.last_state_change
    }

    pub fn restart_count(&self) -> u32 {
        self.restart_count
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }
}

impl Default for AgentLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
