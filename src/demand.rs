//! The demand: the internal unit of work routed from a mailbox to a
//! dispatcher queue and, from there, to a single agent's handler invocation.

// Layer 1: Standard library imports
use std::fmt;
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none for this module)

// Layer 3: Internal module imports
use crate::agent::{Agent, AgentContext};
use crate::message::{MessageEnvelope, MessageType};
use crate::util::AgentId;

/// A boxed subscription handler, bound to one concrete agent type and message
/// type at registration time via a generic call site, then stored here fully
/// type-erased so one subscription table can hold handlers for many agents
/// and many message types.
pub type Handler = Arc<dyn Fn(&mut dyn Agent, &MessageEnvelope, &mut AgentContext) + Send + Sync>;

/// A single unit of routed work: "this agent's handler, applied to this
/// message". Produced by a mailbox when it matches an incoming envelope
/// against its subscription table, and consumed by a dispatcher worker that
/// owns (or can briefly lock) the target agent.
#[derive(Clone)]
pub struct Demand {
    pub envelope: Arc<MessageEnvelope>,
    pub message_type: MessageType,
    pub agent: AgentId,
    pub handler: Handler,
}

impl Demand {
    pub fn new(envelope: Arc<MessageEnvelope>, agent: AgentId, handler: Handler) -> Self {
        let message_type = envelope.message_type();
        Self {
            envelope,
            message_type,
            agent,
            handler,
        }
    }

    /// Invoke the handler against the target agent.
    pub fn execute(&self, agent: &mut dyn Agent, ctx: &mut AgentContext) {
        (self.handler)(agent, &self.envelope, ctx);
    }
}

impl fmt::Debug for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Demand")
            .field("agent", &self.agent)
            .field("message_type", &self.message_type)
            .field("envelope_id", &self.envelope.id)
            .finish_non_exhaustive()
    }
}
