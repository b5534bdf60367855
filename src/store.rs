//! Object store: accumulated input trees keyed by target id.

use std::collections::{HashMap, HashSet};

use crate::manifest::{Manifest, TargetId};
use crate::value::Value;

/// Accumulates input trees submitted over multiple calls within one
/// context.
///
/// Each top-level key of a submitted map is resolved against the manifest;
/// known addresses overwrite any previous entry for that target, unknown
/// addresses are ignored. Targets touched since the last completed
/// evaluation round are flagged "new".
#[derive(Debug, Default)]
pub struct ObjectStore {
    entries: HashMap<TargetId, Value>,
    latest: HashSet<TargetId>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a submitted tree into the store. Returns `false`, leaving the
    /// store untouched, when the top level is not a map or is empty.
    pub fn insert(&mut self, input: Value, manifest: &Manifest) -> bool {
        let entries = match input {
            Value::Map(entries) if !entries.is_empty() => entries,
            _ => return false,
        };
        for (key, value) in entries {
            if let Some(id) = manifest.find(&key) {
                self.entries.insert(id, value);
                self.latest.insert(id);
            }
        }
        true
    }

    pub fn get(&self, target: TargetId) -> Option<&Value> {
        self.entries.get(&target)
    }

    /// Whether this target received a value since the last completed round.
    pub fn is_new(&self, target: TargetId) -> bool {
        self.latest.contains(&target)
    }

    pub fn has_new_targets(&self) -> bool {
        !self.latest.is_empty()
    }

    /// Called by the context after a completed evaluation round.
    pub fn clear_latest(&mut self) {
        self.latest.clear();
    }
}
