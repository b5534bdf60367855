//! Sensitive-data obfuscation verdicts.
//!
//! The obfuscator does not rewrite values itself; it provides a verdict on
//! keys and values, and the event assembly replaces flagged match fragments
//! with the redaction marker.

use regex::{Regex, RegexBuilder};

use crate::error::{Result, WafError};

/// Replacement written into events for sensitive resolved/matched values.
pub const REDACTION_MSG: &str = "<Redacted>";

const DEFAULT_KEY_REGEX: &str = r"(p(ass)?w(or)?d|pass(_?phrase)?|secret|(api_?|private_?|public_?)key)|token|consumer_?(id|key|secret)|sign(ed|ature)|bearer|authorization";

#[derive(Debug)]
pub struct Obfuscator {
    key_regex: Option<Regex>,
    value_regex: Option<Regex>,
}

impl Obfuscator {
    /// Build from custom patterns. An empty key pattern falls back to the
    /// default credential-key heuristic; an empty value pattern disables
    /// value scanning.
    pub fn new(key_regex_str: &str, value_regex_str: &str) -> Result<Self> {
        let compile = |pattern: &str| -> Result<Regex> {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|_| WafError::InvalidRegex(pattern.to_string()))
        };

        let key_regex = if key_regex_str.is_empty() {
            Some(compile(DEFAULT_KEY_REGEX)?)
        } else {
            Some(compile(key_regex_str)?)
        };
        let value_regex = if value_regex_str.is_empty() {
            None
        } else {
            Some(compile(value_regex_str)?)
        };
        Ok(Self { key_regex, value_regex })
    }

    pub fn is_sensitive_key(&self, key: &str) -> bool {
        self.key_regex.as_ref().is_some_and(|re| re.is_match(key))
    }

    pub fn is_sensitive_value(&self, value: &str) -> bool {
        self.value_regex.as_ref().is_some_and(|re| re.is_match(value))
    }
}

impl Default for Obfuscator {
    fn default() -> Self {
        // The default key pattern is a compile-time constant.
        Self::new("", "").expect("default obfuscator pattern")
    }
}
