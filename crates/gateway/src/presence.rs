//! Process-wide presence registry.
//!
//! A set of currently connected identities with a narrow mutation API; the
//! underlying container is never exposed. Rebuilt empty on restart — presence
//! only means "there is an open connection right now".

use std::collections::HashSet;
use std::sync::RwLock;

pub struct PresenceRegistry {
    inner: RwLock<HashSet<String>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashSet::new()),
        }
    }

    /// Mark an identity online. Returns false if it already was.
    pub fn add(&self, identity: &str) -> bool {
        self.inner
            .write()
            .expect("presence registry poisoned")
            .insert(identity.to_string())
    }

    /// Mark an identity offline. Returns false if it was not present.
    pub fn remove(&self, identity: &str) -> bool {
        self.inner
            .write()
            .expect("presence registry poisoned")
            .remove(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.inner
            .read()
            .expect("presence registry poisoned")
            .contains(identity)
    }

    /// The current membership, sorted for stable output.
    pub fn snapshot(&self) -> Vec<String> {
        let mut users: Vec<String> = self
            .inner
            .read()
            .expect("presence registry poisoned")
            .iter()
            .cloned()
            .collect();
        users.sort();
        users
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
