//! In-process request inspection engine.
//!
//! The crate evaluates a compiled set of detection rules against untrusted
//! input trees (headers, query strings, bodies, client identity) submitted
//! incrementally over the lifetime of one transaction. It is a library
//! building block: no I/O, no threads, no global state.
//!
//! ## Architecture
//!
//! - A [`Manifest`] assigns stable integer ids to the root addresses rules
//!   can read, and an [`ObjectStore`] accumulates submitted values per id.
//! - [`Rule`]s are conjunctions of [`Condition`]s; each condition walks its
//!   targets with a budget-bounded iterator and hands candidate strings to
//!   a shared [`MatchOperator`].
//! - A [`Context`] drives one transaction: it applies exclusion filters,
//!   evaluates collections with priority ordering and emits [`Event`]s,
//!   all under a per-call [`Deadline`].
//!
//! ## Example
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use waf_engine::{
//!     Condition, Context, IpMatch, Manifest, Rule, RulesetBuilder, TargetRef,
//! };
//!
//! let mut manifest = Manifest::new();
//! let client_ip = manifest.insert("http.client_ip");
//!
//! let rule = Rule {
//!     id: "blk-001".to_string(),
//!     name: "blocked client address".to_string(),
//!     tags: HashMap::from([("type".to_string(), "ip_blocklist".to_string())]),
//!     conditions: vec![Condition::new(
//!         vec![TargetRef::new(client_ip, "http.client_ip")],
//!         Vec::new(),
//!         Arc::new(IpMatch::new(&["192.168.0.0/16"])?),
//!     )?],
//!     actions: vec!["block".to_string()],
//! };
//!
//! let mut builder = RulesetBuilder::new(manifest);
//! builder.add_rule(rule);
//! let (ruleset, _info) = builder.build()?;
//!
//! let mut context = Context::new(Arc::new(ruleset));
//! let events = context.run(
//!     serde_json::json!({"http.client_ip": "192.168.0.1"}).into(),
//!     Duration::from_millis(2),
//! )?;
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].actions, vec!["block".to_string()]);
//! # Ok::<(), waf_engine::WafError>(())
//! ```

pub mod condition;
pub mod context;
pub mod deadline;
pub mod error;
pub mod event;
pub mod exclusion;
pub mod iterator;
pub mod limits;
pub mod manifest;
pub mod obfuscator;
pub mod operator;
pub mod rule;
pub mod store;
pub mod transformer;
pub mod value;

pub use condition::{Condition, TargetRef};
pub use context::Context;
pub use deadline::Deadline;
pub use error::{Result, WafError};
pub use event::{Event, MatchInfo};
pub use exclusion::{ExclusionMap, InputFilter, ObjectFilter, ObjectRef, RuleFilter};
pub use iterator::{DataSource, TargetIterator};
pub use limits::Limits;
pub use manifest::{Manifest, TargetId};
pub use obfuscator::{Obfuscator, REDACTION_MSG};
pub use operator::{
    DynamicOperators, ExactMatch, IpMatch, MatchOperator, Matched, OperatorRef, PhraseMatch,
    RegexMatch,
};
pub use rule::{Rule, Ruleset, RulesetBuilder, RulesetInfo};
pub use store::ObjectStore;
pub use transformer::Transformer;
pub use value::Value;
