//! Address manifest: stable numeric handles for root addresses.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

pub type TargetId = u32;

/// Bidirectional mapping between textual root addresses (for example
/// `"http.client_ip"`) and small integer target identifiers.
///
/// Built at configuration time and shared read-only across contexts.
#[derive(Debug, Default)]
pub struct Manifest {
    by_address: HashMap<String, TargetId>,
    by_id: HashMap<TargetId, String>,
    next_id: TargetId,
    // Generated lazily, reset on mutation. OnceLock keeps the manifest
    // shareable read-only across contexts.
    root_addresses: OnceLock<Vec<String>>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an address, returning its target id. Idempotent: re-inserting
    /// an existing address returns the original id.
    pub fn insert(&mut self, address: &str) -> TargetId {
        if let Some(&id) = self.by_address.get(address) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.by_address.insert(address.to_string(), id);
        self.by_id.insert(id, address.to_string());
        self.root_addresses.take();
        id
    }

    pub fn find(&self, address: &str) -> Option<TargetId> {
        self.by_address.get(address).copied()
    }

    pub fn name(&self, id: TargetId) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Drop every mapping whose id is not in the live set. Used after
    /// ruleset trimming so the store ignores addresses no rule reads.
    pub fn remove_unused(&mut self, live: &HashSet<TargetId>) {
        self.by_address.retain(|_, id| live.contains(id));
        self.by_id.retain(|id, _| live.contains(id));
        self.root_addresses.take();
    }

    /// All known root addresses. Generated on first call and reused until
    /// the next mutation.
    pub fn root_addresses(&self) -> &[String] {
        self.root_addresses.get_or_init(|| {
            let mut addrs: Vec<String> = self.by_address.keys().cloned().collect();
            addrs.sort();
            addrs
        })
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}
