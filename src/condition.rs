//! Conditions: one testable predicate binding targets to an operator.

use std::collections::HashSet;

use crate::deadline::Deadline;
use crate::error::{Result, WafError};
use crate::event::MatchInfo;
use crate::exclusion::ObjectRef;
use crate::iterator::{DataSource, TargetIterator};
use crate::limits::Limits;
use crate::manifest::TargetId;
use crate::operator::{DynamicOperators, OperatorRef};
use crate::store::ObjectStore;
use crate::transformer::{self, Transformer};

/// A condition's binding to one addressed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRef {
    pub root: TargetId,
    /// Human-readable root address, reported as the match source.
    pub name: String,
    /// Nested key path below the root; empty matches the whole root value.
    pub key_path: Vec<String>,
}

impl TargetRef {
    pub fn new(root: TargetId, name: impl Into<String>) -> Self {
        Self { root, name: name.into(), key_path: Vec::new() }
    }

    pub fn with_key_path(root: TargetId, name: impl Into<String>, key_path: Vec<String>) -> Self {
        Self { root, name: name.into(), key_path }
    }
}

/// One testable predicate: targets, a transformer chain and a shared match
/// operator.
///
/// Evaluation walks targets in declaration order and short-circuits on the
/// first matching leaf. Conditions are immutable and shared; all mutable
/// evaluation state lives in the context.
#[derive(Debug)]
pub struct Condition {
    targets: Vec<TargetRef>,
    transformers: Vec<Transformer>,
    operator: OperatorRef,
    data_id: Option<String>,
    source: DataSource,
}

impl Condition {
    pub fn new(
        targets: Vec<TargetRef>,
        transformers: Vec<Transformer>,
        operator: OperatorRef,
    ) -> Result<Self> {
        if targets.is_empty() {
            return Err(WafError::NoConditionTargets);
        }
        if targets.iter().any(|t| t.name.is_empty()) {
            return Err(WafError::EmptyAddress);
        }
        Ok(Self {
            targets,
            transformers,
            operator,
            data_id: None,
            source: DataSource::Values,
        })
    }

    /// Allow an evaluation-time operator override keyed by this data id.
    pub fn with_data_id(mut self, data_id: impl Into<String>) -> Self {
        self.data_id = Some(data_id.into());
        self
    }

    /// Match on map keys instead of scalar values.
    pub fn with_source(mut self, source: DataSource) -> Self {
        self.source = source;
        self
    }

    pub fn targets(&self) -> &[TargetRef] {
        &self.targets
    }

    fn operator<'a>(&'a self, dynamic: &'a DynamicOperators) -> &'a OperatorRef {
        if let Some(data_id) = &self.data_id {
            if let Some(op) = dynamic.get(data_id) {
                return op;
            }
        }
        &self.operator
    }

    /// Evaluate against the store. First match wins across targets and
    /// leaves; the deadline is checked on every leaf visited.
    ///
    /// With `run_on_new` set, targets whose value is not flagged new are
    /// skipped entirely; the caller is responsible for remembering matches
    /// already produced by earlier rounds.
    pub fn evaluate(
        &self,
        store: &ObjectStore,
        excluded: &HashSet<ObjectRef>,
        run_on_new: bool,
        dynamic: &DynamicOperators,
        limits: &Limits,
        deadline: &mut Deadline,
    ) -> Result<Option<MatchInfo>> {
        let operator = self.operator(dynamic);
        let mut leaf_budget = limits.max_matched_leaves;

        for target in &self.targets {
            if run_on_new && !store.is_new(target.root) {
                continue;
            }
            let Some(root) = store.get(target.root) else {
                continue;
            };

            let excluded_paths: Vec<Vec<String>> = excluded
                .iter()
                .filter(|r| r.target == target.root)
                .map(|r| r.key_path.clone())
                .collect();

            let it = TargetIterator::new(
                root,
                &target.key_path,
                self.source,
                *limits,
                &excluded_paths,
            );
            for (leaf, key_path) in it {
                if deadline.expired() {
                    return Err(WafError::Timeout);
                }
                if leaf_budget == 0 {
                    break;
                }
                leaf_budget -= 1;

                let Some(candidate) = leaf.to_candidate(limits.max_string_length) else {
                    continue;
                };
                let resolved = transformer::apply_all(&self.transformers, candidate);
                if let Some(outcome) = operator.evaluate(&resolved) {
                    return Ok(Some(MatchInfo {
                        resolved,
                        matched: outcome.matched,
                        operator_name: operator.name(),
                        operator_value: operator.value().to_string(),
                        source: target.name.clone(),
                        key_path,
                    }));
                }
            }
        }
        Ok(None)
    }
}
