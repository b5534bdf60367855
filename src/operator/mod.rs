//! Match operators: pluggable predicates applied to candidate strings.
//!
//! Operators are immutable once constructed and shared (`Arc`) across many
//! conditions and contexts. Each evaluation returns whether the candidate
//! matched plus the canonical matched substring reported in events.

pub mod exact;
pub mod ip;
pub mod phrase;
pub mod regex;

use std::collections::HashMap;
use std::sync::Arc;

pub use exact::ExactMatch;
pub use ip::IpMatch;
pub use phrase::PhraseMatch;
pub use regex::RegexMatch;

/// Outcome of a successful operator evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matched {
    /// The substring (or canonical form) that satisfied the operator.
    pub matched: String,
}

impl Matched {
    pub fn new(matched: impl Into<String>) -> Self {
        Self { matched: matched.into() }
    }
}

/// A pure match predicate over candidate strings.
///
/// Implementations must be safe to share read-only across threads; all
/// engine-owned state lives in the condition and context instead.
pub trait MatchOperator: Send + Sync {
    /// Stable operator name reported in events, e.g. `"ip_match"`.
    fn name(&self) -> &'static str;

    /// Operator parameter label reported in events (the regex source for
    /// `regex_match`); empty when the operator has no single parameter.
    fn value(&self) -> &str {
        ""
    }

    fn evaluate(&self, candidate: &str) -> Option<Matched>;
}

impl std::fmt::Debug for dyn MatchOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchOperator")
            .field("name", &self.name())
            .field("value", &self.value())
            .finish()
    }
}

/// Shared handle to an operator.
pub type OperatorRef = Arc<dyn MatchOperator>;

/// Evaluation-time operator overrides keyed by data id, used for
/// hot-swappable data sets such as IP blocklists.
pub type DynamicOperators = HashMap<String, OperatorRef>;
