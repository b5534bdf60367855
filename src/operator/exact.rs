//! Exact string matching against a fixed value list.

use super::{MatchOperator, Matched};

/// Matches when the candidate equals any of the configured values.
#[derive(Debug, Clone)]
pub struct ExactMatch {
    values: Vec<String>,
}

impl ExactMatch {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }
}

impl MatchOperator for ExactMatch {
    fn name(&self) -> &'static str {
        "exact_match"
    }

    fn evaluate(&self, candidate: &str) -> Option<Matched> {
        self.values
            .iter()
            .any(|v| v == candidate)
            .then(|| Matched::new(candidate))
    }
}
