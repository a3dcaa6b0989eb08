//! Environment-owned mailbox lookup: by name (for discoverable, long-lived
//! mailboxes) and by address id (needed to resolve an anonymous `reply_to`
//! back to a live mailbox for the service-request rendezvous).

// Layer 1: Standard library imports
use std::collections::HashMap;

// Layer 2: Third-party crate imports
use parking_lot::RwLock;

// Layer 3: Internal module imports
use super::mailbox::Mailbox;
use crate::util::MailboxAddress;

/// A registry of every mailbox an environment has created.
///
/// Grounded on the teacher's environment-owned actor registry, generalized
/// from an id-only lookup to a dual name/id lookup: most mailboxes are
/// reached by name (`mailbox_by_name`), but a service request's anonymous
/// reply mailbox is only ever reached by the id embedded in its address.
#[derive(Default)]
pub struct MailboxRegistry {
    by_name: RwLock<HashMap<String, Mailbox>>,
    by_id: RwLock<HashMap<u64, Mailbox>>,
}

impl MailboxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `mailbox`, indexing it by id and, if named, by name too.
    /// Returns `false` without inserting anything if a mailbox is already
    /// registered under the same name.
    pub fn insert(&self, mailbox: Mailbox) -> bool {
        let address = mailbox.address().clone();
        if let Some(name) = address.name() {
            let mut by_name = self.by_name.write();
            if by_name.contains_key(name) {
                return false;
            }
            by_name.insert(name.to_string(), mailbox.clone());
        }
        self.by_id.write().insert(address.id(), mailbox);
        true
    }

    pub fn by_name(&self, name: &str) -> Option<Mailbox> {
        self.by_name.read().get(name).cloned()
    }

    pub fn by_id(&self, id: u64) -> Option<Mailbox> {
        self.by_id.read().get(&id).cloned()
    }

    pub fn by_address(&self, address: &MailboxAddress) -> Option<Mailbox> {
        self.by_id(address.id())
    }

    /// Drop a mailbox from the registry, e.g. once a service request's
    /// ephemeral reply mailbox has been consumed.
    pub fn remove(&self, address: &MailboxAddress) {
        self.by_id.write().remove(&address.id());
        if let Some(name) = address.name() {
            self.by_name.write().remove(name);
        }
    }
}
