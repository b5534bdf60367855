//! Events: the result surface of a successful rule evaluation.

use serde::Serialize;

use crate::obfuscator::{Obfuscator, REDACTION_MSG};

/// One condition's match details within an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchInfo {
    /// Candidate value after transformers, possibly redacted.
    pub resolved: String,
    /// Substring that satisfied the operator, possibly redacted.
    pub matched: String,
    /// Stable operator name, e.g. `"ip_match"`.
    pub operator_name: &'static str,
    /// Operator parameter label; empty when not applicable.
    pub operator_value: String,
    /// Root address the value was read from, e.g. `"http.client_ip"`.
    pub source: String,
    /// Key path of the matched leaf below the root; empty for the root
    /// itself.
    pub key_path: Vec<String>,
}

impl MatchInfo {
    /// Consult the obfuscator and redact the fragment in place when the
    /// key path or the resolved value is sensitive.
    pub fn redact(&mut self, obfuscator: &Obfuscator) {
        let sensitive = self.key_path.iter().any(|k| obfuscator.is_sensitive_key(k))
            || obfuscator.is_sensitive_value(&self.resolved)
            || obfuscator.is_sensitive_value(&self.matched);
        if sensitive {
            self.resolved = REDACTION_MSG.to_string();
            self.matched = REDACTION_MSG.to_string();
        }
    }
}

/// One rule's successful evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub rule_type: String,
    pub category: String,
    pub actions: Vec<String>,
    pub matches: Vec<MatchInfo>,
}
