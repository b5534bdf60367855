//! Multi-pattern phrase matching built on Aho-Corasick.

use aho_corasick::AhoCorasick;

use super::{MatchOperator, Matched};
use crate::error::{Result, WafError};

/// Matches when any configured phrase occurs as a substring of the
/// candidate; the phrase found first (leftmost) is reported.
pub struct PhraseMatch {
    patterns: Vec<String>,
    searcher: AhoCorasick,
}

impl PhraseMatch {
    pub fn new(patterns: Vec<String>) -> Result<Self> {
        let searcher = AhoCorasick::new(&patterns)
            .map_err(|e| WafError::InvalidPhraseSet(e.to_string()))?;
        Ok(Self { patterns, searcher })
    }
}

impl MatchOperator for PhraseMatch {
    fn name(&self) -> &'static str {
        "phrase_match"
    }

    fn evaluate(&self, candidate: &str) -> Option<Matched> {
        self.searcher
            .find(candidate)
            .map(|m| Matched::new(self.patterns[m.pattern().as_usize()].clone()))
    }
}
