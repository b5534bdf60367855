//! Rules, collections and the ruleset builder.
//!
//! A rule is a conjunction of conditions plus identifying tags. Rules with
//! the same `type` tag form a collection; rules carrying actions are
//! priority rules and run before the rest of their collection.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::condition::Condition;
use crate::error::{Result, WafError};
use crate::event::{Event, MatchInfo};
use crate::exclusion::{InputFilter, RuleFilter};
use crate::limits::Limits;
use crate::manifest::Manifest;
use crate::obfuscator::Obfuscator;

/// An immutable detection rule. All conditions must match for the rule to
/// produce an event.
#[derive(Debug)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub tags: HashMap<String, String>,
    pub conditions: Vec<Condition>,
    pub actions: Vec<String>,
}

impl Rule {
    /// Priority rules carry actions and are evaluated ahead of the rest of
    /// their collection.
    pub fn is_priority(&self) -> bool {
        !self.actions.is_empty()
    }

    /// The collection this rule belongs to, from the mandatory `type` tag.
    pub fn rule_type(&self) -> &str {
        self.tags.get("type").map(String::as_str).unwrap_or("")
    }

    pub fn category(&self) -> &str {
        self.tags.get("category").map(String::as_str).unwrap_or("")
    }

    /// Assemble the event for a full set of condition matches.
    pub fn build_event(&self, mut matches: Vec<MatchInfo>, obfuscator: &Obfuscator) -> Event {
        for m in &mut matches {
            m.redact(obfuscator);
        }
        Event {
            id: self.id.clone(),
            name: self.name.clone(),
            rule_type: self.rule_type().to_string(),
            category: self.category().to_string(),
            actions: self.actions.clone(),
            matches,
        }
    }
}

/// One collection's rules, split by priority, as indices into the ruleset.
#[derive(Debug)]
pub(crate) struct Collection {
    pub name: String,
    pub priority: Vec<usize>,
    pub regular: Vec<usize>,
}

/// The compiled, immutable evaluation unit shared by all contexts.
#[derive(Debug)]
pub struct Ruleset {
    manifest: Manifest,
    rules: Vec<Arc<Rule>>,
    collections: Vec<Collection>,
    rule_filters: Vec<RuleFilter>,
    input_filters: Vec<InputFilter>,
    limits: Limits,
    obfuscator: Obfuscator,
}

impl Ruleset {
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn obfuscator(&self) -> &Obfuscator {
        &self.obfuscator
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule(&self, index: usize) -> &Arc<Rule> {
        &self.rules[index]
    }

    pub(crate) fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub(crate) fn rule_filters(&self) -> &[RuleFilter] {
        &self.rule_filters
    }

    pub(crate) fn input_filters(&self) -> &[InputFilter] {
        &self.input_filters
    }
}

/// Load diagnostics reported alongside a built ruleset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RulesetInfo {
    pub loaded: u32,
    pub failed: u32,
    /// Error message to the ids of the rules rejected with it.
    pub errors: HashMap<String, Vec<String>>,
}

impl RulesetInfo {
    fn record_failure(&mut self, rule_id: &str, error: &WafError) {
        self.failed += 1;
        self.errors
            .entry(error.to_string())
            .or_default()
            .push(rule_id.to_string());
    }
}

/// Accumulates rules and filters, validating as it goes; invalid rules are
/// reported through [`RulesetInfo`] without failing the whole load.
pub struct RulesetBuilder {
    manifest: Manifest,
    rules: Vec<Arc<Rule>>,
    seen_ids: HashSet<String>,
    rule_filters: Vec<RuleFilter>,
    input_filters: Vec<InputFilter>,
    limits: Limits,
    obfuscator: Obfuscator,
    info: RulesetInfo,
}

impl RulesetBuilder {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            manifest,
            rules: Vec::new(),
            seen_ids: HashSet::new(),
            rule_filters: Vec::new(),
            input_filters: Vec::new(),
            limits: Limits::default(),
            obfuscator: Obfuscator::default(),
            info: RulesetInfo::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_obfuscator(mut self, obfuscator: Obfuscator) -> Self {
        self.obfuscator = obfuscator;
        self
    }

    fn validate(&self, rule: &Rule) -> Result<()> {
        if self.seen_ids.contains(&rule.id) {
            return Err(WafError::DuplicateRule(rule.id.clone()));
        }
        if !rule.tags.contains_key("type") {
            return Err(WafError::MissingTag("type".to_string()));
        }
        // Rules without conditions load: they can never match, but they
        // remain valid targets for exclusion filters.
        Ok(())
    }

    pub fn add_rule(&mut self, rule: Rule) -> &mut Self {
        match self.validate(&rule) {
            Ok(()) => {
                self.info.loaded += 1;
                self.seen_ids.insert(rule.id.clone());
                self.rules.push(Arc::new(rule));
            }
            Err(e) => self.info.record_failure(&rule.id, &e),
        }
        self
    }

    pub fn add_rule_filter(&mut self, filter: RuleFilter) -> &mut Self {
        self.rule_filters.push(filter);
        self
    }

    pub fn add_input_filter(&mut self, filter: InputFilter) -> &mut Self {
        self.input_filters.push(filter);
        self
    }

    /// Finish the load: group rules into collections, drop manifest
    /// entries nothing references and hand back the diagnostics.
    pub fn build(mut self) -> Result<(Ruleset, RulesetInfo)> {
        if self.rules.is_empty() {
            return Err(WafError::EmptyRuleset);
        }

        let mut collections: Vec<Collection> = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            let name = rule.rule_type();
            let pos = match collections.iter().position(|c| c.name == name) {
                Some(p) => p,
                None => {
                    collections.push(Collection {
                        name: name.to_string(),
                        priority: Vec::new(),
                        regular: Vec::new(),
                    });
                    collections.len() - 1
                }
            };
            let collection = &mut collections[pos];
            if rule.is_priority() {
                collection.priority.push(index);
            } else {
                collection.regular.push(index);
            }
        }

        let mut used = HashSet::new();
        for rule in &self.rules {
            for condition in &rule.conditions {
                used.extend(condition.targets().iter().map(|t| t.root));
            }
        }
        for filter in &self.rule_filters {
            filter.collect_targets(&mut used);
        }
        for filter in &self.input_filters {
            filter.collect_targets(&mut used);
        }
        self.manifest.remove_unused(&used);

        Ok((
            Ruleset {
                manifest: self.manifest,
                rules: self.rules,
                collections,
                rule_filters: self.rule_filters,
                input_filters: self.input_filters,
                limits: self.limits,
                obfuscator: self.obfuscator,
            },
            self.info,
        ))
    }
}
