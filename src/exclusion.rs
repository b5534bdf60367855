//! Exclusion filters: suppress whole rules or carve values out of the
//! data visible to specific rules.
//!
//! Filters are conjunctions of regular conditions. A rule filter that
//! triggers removes its listed rules from evaluation; an input filter that
//! triggers hides the objects named by its object filter from its listed
//! rules. Filter outcomes accumulate across calls on the same context.

use std::collections::{HashMap, HashSet};

use crate::condition::Condition;
use crate::deadline::Deadline;
use crate::error::Result;
use crate::limits::Limits;
use crate::manifest::TargetId;
use crate::operator::DynamicOperators;
use crate::store::ObjectStore;

/// Stable reference to a value in the store: a root target plus the key
/// path below it. An empty key path refers to the whole root value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub target: TargetId,
    pub key_path: Vec<String>,
}

impl ObjectRef {
    pub fn root(target: TargetId) -> Self {
        Self { target, key_path: Vec::new() }
    }

    pub fn new(target: TargetId, key_path: Vec<String>) -> Self {
        Self { target, key_path }
    }
}

/// Per-rule sets of objects hidden from evaluation.
pub type ExclusionMap = HashMap<String, HashSet<ObjectRef>>;

/// The object selection of an input filter.
#[derive(Debug, Default, Clone)]
pub struct ObjectFilter {
    entries: Vec<ObjectRef>,
}

impl ObjectFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a whole root address.
    pub fn insert(&mut self, target: TargetId) {
        self.entries.push(ObjectRef::root(target));
    }

    /// Select a nested value below a root address.
    pub fn insert_key_path(&mut self, target: TargetId, key_path: Vec<String>) {
        self.entries.push(ObjectRef::new(target, key_path));
    }

    pub(crate) fn collect_targets(&self, out: &mut HashSet<TargetId>) {
        out.extend(self.entries.iter().map(|r| r.target));
    }

    /// Resolve the selection against the store. Only roots currently
    /// present resolve; the filter is re-applied on later calls so roots
    /// submitted afterwards are picked up then.
    pub fn resolve(&self, store: &ObjectStore) -> Vec<ObjectRef> {
        self.entries
            .iter()
            .filter(|r| store.get(r.target).is_some())
            .cloned()
            .collect()
    }
}

fn conditions_met(
    conditions: &[Condition],
    store: &ObjectStore,
    dynamic: &DynamicOperators,
    limits: &Limits,
    deadline: &mut Deadline,
) -> Result<bool> {
    let no_exclusions = HashSet::new();
    for condition in conditions {
        let matched = condition
            .evaluate(store, &no_exclusions, false, dynamic, limits, deadline)?
            .is_some();
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Removes whole rules from evaluation while its conditions hold.
#[derive(Debug)]
pub struct RuleFilter {
    pub id: String,
    conditions: Vec<Condition>,
    rule_ids: Vec<String>,
}

impl RuleFilter {
    /// An unconditional filter has no conditions and always triggers.
    pub fn new(id: impl Into<String>, conditions: Vec<Condition>, rule_ids: Vec<String>) -> Self {
        Self { id: id.into(), conditions, rule_ids }
    }

    pub fn rule_ids(&self) -> &[String] {
        &self.rule_ids
    }

    pub(crate) fn collect_targets(&self, out: &mut HashSet<TargetId>) {
        for condition in &self.conditions {
            out.extend(condition.targets().iter().map(|t| t.root));
        }
    }

    /// True when every condition matched the current store.
    pub fn evaluate(
        &self,
        store: &ObjectStore,
        dynamic: &DynamicOperators,
        limits: &Limits,
        deadline: &mut Deadline,
    ) -> Result<bool> {
        conditions_met(&self.conditions, store, dynamic, limits, deadline)
    }
}

/// Hides selected objects from its listed rules while its conditions hold.
#[derive(Debug)]
pub struct InputFilter {
    pub id: String,
    conditions: Vec<Condition>,
    rule_ids: Vec<String>,
    filter: ObjectFilter,
}

impl InputFilter {
    pub fn new(
        id: impl Into<String>,
        conditions: Vec<Condition>,
        rule_ids: Vec<String>,
        filter: ObjectFilter,
    ) -> Self {
        Self { id: id.into(), conditions, rule_ids, filter }
    }

    pub fn rule_ids(&self) -> &[String] {
        &self.rule_ids
    }

    pub(crate) fn collect_targets(&self, out: &mut HashSet<TargetId>) {
        for condition in &self.conditions {
            out.extend(condition.targets().iter().map(|t| t.root));
        }
        self.filter.collect_targets(out);
    }

    /// When the conditions hold, the objects currently resolvable by the
    /// object filter; `None` otherwise.
    pub fn evaluate(
        &self,
        store: &ObjectStore,
        dynamic: &DynamicOperators,
        limits: &Limits,
        deadline: &mut Deadline,
    ) -> Result<Option<Vec<ObjectRef>>> {
        if !conditions_met(&self.conditions, store, dynamic, limits, deadline)? {
            return Ok(None);
        }
        Ok(Some(self.filter.resolve(store)))
    }
}
