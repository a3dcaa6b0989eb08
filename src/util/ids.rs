// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Layer 3: Internal module imports
// (none)

/// Unique identifier for agents in the environment.
///
/// # Example
/// ```rust
/// use agentbeam::util::AgentId;
///
/// let a = AgentId::new();
/// let b = AgentId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(Uuid);

impl AgentId {
    /// Generate a new random agent id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a single message instance (used in monitoring events,
/// not part of the subscription key — see [`crate::message::MessageType`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a cooperation (an atomically registered group of agents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CooperationId(Uuid);

impl CooperationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CooperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CooperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a mailbox: named (discoverable by string, unique within an
/// environment) or anonymous (reachable only via the handle returned at creation).
///
/// # Example
/// ```rust
/// use agentbeam::util::MailboxAddress;
///
/// let named = MailboxAddress::named("orders");
/// assert_eq!(named.name(), Some("orders"));
///
/// let anon = MailboxAddress::anonymous();
/// assert_eq!(anon.name(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MailboxAddress {
    Named { id: u64, name: String },
    Anonymous { id: u64 },
}

impl MailboxAddress {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            id: next_mailbox_id(),
            name: name.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::Anonymous {
            id: next_mailbox_id(),
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Self::Named { id, .. } | Self::Anonymous { id } => *id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named { name, .. } => Some(name),
            Self::Anonymous { .. } => None,
        }
    }
}

impl Display for MailboxAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { id, name } => write!(f, "{name}#{id}"),
            Self::Anonymous { id } => write!(f, "anonymous#{id}"),
        }
    }
}

fn next_mailbox_id() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}
