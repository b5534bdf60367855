//! Per-transaction evaluation context.
//!
//! A context accumulates input across calls, applies exclusion filters and
//! evaluates the ruleset collection by collection. Rule and filter outcomes
//! persist for the lifetime of the context: a rule produces at most one
//! event, a matched collection stays closed for non-priority rules, and
//! exclusions only ever grow.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::deadline::Deadline;
use crate::error::{Result, WafError};
use crate::event::{Event, MatchInfo};
use crate::exclusion::ExclusionMap;
use crate::operator::DynamicOperators;
use crate::rule::Ruleset;
use crate::store::ObjectStore;
use crate::value::Value;

/// Persistent per-rule evaluation state.
struct RuleState {
    /// The rule has been evaluated at least once; later rounds only look
    /// at newly submitted targets.
    attempted: bool,
    /// The rule already produced its event.
    matched: bool,
    /// Condition matches carried over from earlier rounds.
    fragments: Vec<Option<MatchInfo>>,
}

impl RuleState {
    fn new(conditions: usize) -> Self {
        Self {
            attempted: false,
            matched: false,
            fragments: vec![None; conditions],
        }
    }
}

pub struct Context {
    ruleset: Arc<Ruleset>,
    store: ObjectStore,
    rule_states: HashMap<String, RuleState>,
    matched_collections: HashSet<String>,
    excluded_rules: HashSet<String>,
    exclusions: ExclusionMap,
    triggered_rule_filters: HashSet<usize>,
}

impl Context {
    pub fn new(ruleset: Arc<Ruleset>) -> Self {
        Self {
            ruleset,
            store: ObjectStore::new(),
            rule_states: HashMap::new(),
            matched_collections: HashSet::new(),
            excluded_rules: HashSet::new(),
            exclusions: ExclusionMap::new(),
            triggered_rule_filters: HashSet::new(),
        }
    }

    /// Submit an input tree without evaluating. The top level must be a
    /// non-empty map; its keys are resolved against the manifest.
    pub fn insert(&mut self, input: Value) -> Result<()> {
        if self.store.insert(input, self.ruleset.manifest()) {
            Ok(())
        } else {
            Err(WafError::InvalidObject)
        }
    }

    /// Submit input and evaluate within the given time budget.
    pub fn run(&mut self, input: Value, budget: Duration) -> Result<Vec<Event>> {
        self.insert(input)?;
        self.evaluate(&DynamicOperators::new(), budget)
    }

    /// Like [`run`](Self::run), with per-call operator overrides keyed by
    /// data id.
    pub fn run_with_overrides(
        &mut self,
        input: Value,
        dynamic: &DynamicOperators,
        budget: Duration,
    ) -> Result<Vec<Event>> {
        self.insert(input)?;
        self.evaluate(dynamic, budget)
    }

    /// Evaluate the ruleset against everything submitted so far.
    ///
    /// Returns the events produced by this round only. A round with no new
    /// targets is a no-op. On timeout the round is abandoned and the new
    /// flags are kept, so a retry with a fresh budget sees the same data.
    pub fn evaluate(
        &mut self,
        dynamic: &DynamicOperators,
        budget: Duration,
    ) -> Result<Vec<Event>> {
        if !self.store.has_new_targets() {
            return Ok(Vec::new());
        }
        let ruleset = Arc::clone(&self.ruleset);
        let mut deadline = Deadline::new(budget);

        self.filter_rules(dynamic, &mut deadline)?;
        self.filter_inputs(dynamic, &mut deadline)?;

        let mut events = Vec::new();
        for collection in ruleset.collections() {
            for &index in &collection.priority {
                if let Some(event) = self.evaluate_rule(&ruleset, index, dynamic, &mut deadline)? {
                    self.matched_collections.insert(collection.name.clone());
                    events.push(event);
                }
            }
            if self.matched_collections.contains(&collection.name) {
                continue;
            }
            for &index in &collection.regular {
                if let Some(event) = self.evaluate_rule(&ruleset, index, dynamic, &mut deadline)? {
                    self.matched_collections.insert(collection.name.clone());
                    events.push(event);
                    break;
                }
            }
        }

        self.store.clear_latest();
        Ok(events)
    }

    /// Evaluate the rule filters against the current store and return the
    /// accumulated set of excluded rule ids.
    ///
    /// Monotonic: a filter that triggered stays triggered and is not
    /// re-evaluated, so the returned set only ever grows over the lifetime
    /// of the context. Called by [`evaluate`](Self::evaluate); also usable
    /// directly to inspect exclusions without running the rules.
    pub fn filter_rules(
        &mut self,
        dynamic: &DynamicOperators,
        deadline: &mut Deadline,
    ) -> Result<&HashSet<String>> {
        let ruleset = Arc::clone(&self.ruleset);
        for (index, filter) in ruleset.rule_filters().iter().enumerate() {
            if self.triggered_rule_filters.contains(&index) {
                continue;
            }
            if deadline.expired() {
                return Err(WafError::Timeout);
            }
            if filter.evaluate(&self.store, dynamic, ruleset.limits(), deadline)? {
                self.triggered_rule_filters.insert(index);
                for id in filter.rule_ids() {
                    self.excluded_rules.insert(id.clone());
                    // Fully excluded rules need no per-object exclusions.
                    self.exclusions.remove(id);
                }
            }
        }
        Ok(&self.excluded_rules)
    }

    /// Evaluate the input filters and return the accumulated per-rule
    /// exclusion map.
    ///
    /// Re-applied every round so roots submitted after a filter first
    /// triggered are still picked up; resolved objects accumulate per
    /// rule. Rules already excluded wholesale by
    /// [`filter_rules`](Self::filter_rules) get no entry.
    pub fn filter_inputs(
        &mut self,
        dynamic: &DynamicOperators,
        deadline: &mut Deadline,
    ) -> Result<&ExclusionMap> {
        let ruleset = Arc::clone(&self.ruleset);
        for filter in ruleset.input_filters() {
            if deadline.expired() {
                return Err(WafError::Timeout);
            }
            let Some(objects) =
                filter.evaluate(&self.store, dynamic, ruleset.limits(), deadline)?
            else {
                continue;
            };
            for id in filter.rule_ids() {
                if self.excluded_rules.contains(id) {
                    continue;
                }
                self.exclusions
                    .entry(id.clone())
                    .or_default()
                    .extend(objects.iter().cloned());
            }
        }
        Ok(&self.exclusions)
    }

    fn evaluate_rule(
        &mut self,
        ruleset: &Ruleset,
        index: usize,
        dynamic: &DynamicOperators,
        deadline: &mut Deadline,
    ) -> Result<Option<Event>> {
        let rule = ruleset.rule(index);
        if self.excluded_rules.contains(&rule.id) {
            return Ok(None);
        }
        // A rule without conditions vacuously matches nothing.
        if rule.conditions.is_empty() {
            return Ok(None);
        }

        let state = self
            .rule_states
            .entry(rule.id.clone())
            .or_insert_with(|| RuleState::new(rule.conditions.len()));
        if state.matched {
            return Ok(None);
        }
        let run_on_new = state.attempted;
        state.attempted = true;

        let no_exclusions = HashSet::new();
        let excluded = self.exclusions.get(&rule.id).unwrap_or(&no_exclusions);

        for (i, condition) in rule.conditions.iter().enumerate() {
            if state.fragments[i].is_some() {
                continue;
            }
            match condition.evaluate(
                &self.store,
                excluded,
                run_on_new,
                dynamic,
                ruleset.limits(),
                deadline,
            )? {
                Some(info) => state.fragments[i] = Some(info),
                None => return Ok(None),
            }
        }

        state.matched = true;
        let matches: Vec<MatchInfo> = state.fragments.iter_mut().filter_map(Option::take).collect();
        Ok(Some(rule.build_event(matches, ruleset.obfuscator())))
    }
}
