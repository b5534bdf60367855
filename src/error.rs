//! Error types for the waf-engine crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WafError>;

/// Failures surfaced by the engine.
///
/// `Timeout` is the only condition that unwinds through condition, rule and
/// context evaluation; everything else is reported locally at the call that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WafError {
    /// The shared deadline expired while filtering or matching. The call's
    /// partial results are discarded; the context remains usable.
    #[error("deadline exceeded during evaluation")]
    Timeout,

    /// A submitted input tree was not a non-empty map at the top level.
    #[error("invalid input object: top level must be a non-empty map")]
    InvalidObject,

    #[error("invalid regex pattern: {0}")]
    InvalidRegex(String),
    #[error("invalid IP address: {0}")]
    InvalidIpAddress(String),
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
    #[error("unknown transformer: {0}")]
    UnknownTransformer(String),
    #[error("invalid phrase set: {0}")]
    InvalidPhraseSet(String),

    // Ruleset construction failures, reported per rule or filter.
    #[error("duplicate rule id: {0}")]
    DuplicateRule(String),
    #[error("rule is missing required tag: {0}")]
    MissingTag(String),
    #[error("condition has no targets")]
    NoConditionTargets,
    #[error("empty target address")]
    EmptyAddress,
    #[error("ruleset contains no loaded rules")]
    EmptyRuleset,
}
