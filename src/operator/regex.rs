//! Regular-expression matching.

use regex::{Regex, RegexBuilder};

use super::{MatchOperator, Matched};
use crate::error::{Result, WafError};

/// Matches when the compiled pattern finds a match in the candidate; the
/// matched substring is reported.
#[derive(Debug, Clone)]
pub struct RegexMatch {
    pattern: String,
    regex: Regex,
}

impl RegexMatch {
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|_| WafError::InvalidRegex(pattern.to_string()))?;
        Ok(Self { pattern: pattern.to_string(), regex })
    }
}

impl MatchOperator for RegexMatch {
    fn name(&self) -> &'static str {
        "regex_match"
    }

    fn value(&self) -> &str {
        &self.pattern
    }

    fn evaluate(&self, candidate: &str) -> Option<Matched> {
        self.regex
            .find(candidate)
            .map(|m| Matched::new(m.as_str()))
    }
}
