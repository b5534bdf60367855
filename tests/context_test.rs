//! End-to-end evaluation scenarios driving the public API only.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use waf_engine::{
    Condition, Context, Deadline, DynamicOperators, ExactMatch, InputFilter, IpMatch, Manifest,
    ObjectFilter, ObjectRef, Rule, RuleFilter, RulesetBuilder, TargetRef, WafError, REDACTION_MSG,
};

const BUDGET: Duration = Duration::from_secs(2);

fn tags(rule_type: &str) -> HashMap<String, String> {
    HashMap::from([
        ("type".to_string(), rule_type.to_string()),
        ("category".to_string(), "category1".to_string()),
    ])
}

fn exact_rule(manifest: &mut Manifest, id: &str, rule_type: &str, address: &str, value: &str) -> Rule {
    let target = manifest.insert(address);
    Rule {
        id: id.to_string(),
        name: format!("rule-{id}"),
        tags: tags(rule_type),
        conditions: vec![Condition::new(
            vec![TargetRef::new(target, address)],
            Vec::new(),
            Arc::new(ExactMatch::new(vec![value.to_string()])),
        )
        .unwrap()],
        actions: Vec::new(),
    }
}

fn exact_condition(manifest: &mut Manifest, address: &str, value: &str) -> Condition {
    let target = manifest.insert(address);
    Condition::new(
        vec![TargetRef::new(target, address)],
        Vec::new(),
        Arc::new(ExactMatch::new(vec![value.to_string()])),
    )
    .unwrap()
}

#[test]
fn test_ip_match_end_to_end() {
    let mut manifest = Manifest::new();
    let target = manifest.insert("http.client_ip");
    let rule = Rule {
        id: "1".to_string(),
        name: "blocked ip".to_string(),
        tags: tags("ip_blocklist"),
        conditions: vec![Condition::new(
            vec![TargetRef::new(target, "http.client_ip")],
            Vec::new(),
            Arc::new(IpMatch::new(&["192.168.0.1"]).unwrap()),
        )
        .unwrap()],
        actions: vec!["block".to_string()],
    };
    let mut builder = RulesetBuilder::new(manifest);
    builder.add_rule(rule);
    let (ruleset, info) = builder.build().unwrap();
    assert_eq!(info.loaded, 1);
    let ruleset = Arc::new(ruleset);

    // Match.
    let mut context = Context::new(Arc::clone(&ruleset));
    let events = context
        .run(json!({"http.client_ip": "192.168.0.1"}).into(), BUDGET)
        .unwrap();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.id, "1");
    assert_eq!(event.rule_type, "ip_blocklist");
    assert_eq!(event.actions, vec!["block".to_string()]);
    assert_eq!(event.matches[0].source, "http.client_ip");
    assert_eq!(event.matches[0].resolved, "192.168.0.1");

    // No match.
    let mut context = Context::new(Arc::clone(&ruleset));
    let events = context
        .run(json!({"http.client_ip": "192.168.0.2"}).into(), BUDGET)
        .unwrap();
    assert!(events.is_empty());

    // Timeout.
    let mut context = Context::new(ruleset);
    let err = context
        .run(json!({"http.client_ip": "192.168.0.1"}).into(), Duration::ZERO)
        .unwrap_err();
    assert_eq!(err, WafError::Timeout);
}

fn priority_ruleset() -> Arc<waf_engine::Ruleset> {
    let mut manifest = Manifest::new();
    let regular = exact_rule(&mut manifest, "regular", "flow1", "http.client_ip", "192.168.0.1");
    let mut priority = exact_rule(&mut manifest, "priority", "flow1", "usr.id", "admin");
    priority.actions.push("block".to_string());
    let mut builder = RulesetBuilder::new(manifest);
    builder.add_rule(regular).add_rule(priority);
    let (ruleset, _) = builder.build().unwrap();
    Arc::new(ruleset)
}

#[test]
fn test_priority_wins_single_call() {
    let mut context = Context::new(priority_ruleset());
    let events = context
        .run(
            json!({"http.client_ip": "192.168.0.1", "usr.id": "admin"}).into(),
            BUDGET,
        )
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "priority");
}

#[test]
fn test_priority_fires_after_regular_closed_collection() {
    let mut context = Context::new(priority_ruleset());

    let events = context
        .run(json!({"http.client_ip": "192.168.0.1"}).into(), BUDGET)
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "regular");

    let events = context.run(json!({"usr.id": "admin"}).into(), BUDGET).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "priority");
}

#[test]
fn test_regular_suppressed_after_priority_match() {
    let mut context = Context::new(priority_ruleset());

    let events = context.run(json!({"usr.id": "admin"}).into(), BUDGET).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "priority");

    let events = context
        .run(json!({"http.client_ip": "192.168.0.1"}).into(), BUDGET)
        .unwrap();
    assert!(events.is_empty());
}

/// Nine single-rule collections and three rule filters, each keyed to a
/// different user and each excluding three rules.
fn filtered_ruleset() -> Arc<waf_engine::Ruleset> {
    let mut manifest = Manifest::new();
    let mut builder_rules = Vec::new();
    for i in 1..=9 {
        builder_rules.push(exact_rule(
            &mut manifest,
            &i.to_string(),
            &format!("flow{i}"),
            "value",
            "trigger",
        ));
    }
    let filters: Vec<RuleFilter> = (0..3)
        .map(|f| {
            let condition = exact_condition(&mut manifest, "usr.id", &format!("admin{}", f + 1));
            let rule_ids = (1..=3).map(|i| (f * 3 + i).to_string()).collect();
            RuleFilter::new(format!("filter{}", f + 1), vec![condition], rule_ids)
        })
        .collect();

    let mut builder = RulesetBuilder::new(manifest);
    for rule in builder_rules {
        builder.add_rule(rule);
    }
    for filter in filters {
        builder.add_rule_filter(filter);
    }
    let (ruleset, _) = builder.build().unwrap();
    Arc::new(ruleset)
}

#[test]
fn test_rule_filter_excludes_listed_rules() {
    let mut context = Context::new(filtered_ruleset());
    let events = context
        .run(json!({"usr.id": "admin1", "value": "trigger"}).into(), BUDGET)
        .unwrap();
    let mut ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, ["4", "5", "6", "7", "8", "9"]);
}

#[test]
fn test_rule_filter_exclusions_accumulate() {
    let mut context = Context::new(filtered_ruleset());

    let events = context
        .run(json!({"usr.id": "admin1", "value": "trigger"}).into(), BUDGET)
        .unwrap();
    assert_eq!(events.len(), 6);

    // usr.id is overwritten, but the first filter's exclusions persist:
    // rules 1-3 stay excluded even though its condition no longer holds.
    let events = context
        .run(json!({"usr.id": "admin2", "value": "trigger"}).into(), BUDGET)
        .unwrap();
    assert!(events.is_empty());

    let events = context
        .run(json!({"usr.id": "admin3", "value": "trigger"}).into(), BUDGET)
        .unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_filter_rules_reports_growing_exclusion_set() {
    let mut context = Context::new(filtered_ruleset());
    let dynamic = DynamicOperators::new();
    let mut deadline = Deadline::new(BUDGET);

    context.insert(json!({"usr.id": "admin1"}).into()).unwrap();
    let excluded = context.filter_rules(&dynamic, &mut deadline).unwrap();
    assert_eq!(excluded.len(), 3);
    assert!(excluded.contains("1") && excluded.contains("2") && excluded.contains("3"));

    // Each later user widens the set; earlier exclusions are kept even
    // though usr.id has been overwritten.
    context.insert(json!({"usr.id": "admin2"}).into()).unwrap();
    let excluded = context.filter_rules(&dynamic, &mut deadline).unwrap();
    assert_eq!(excluded.len(), 6);
    assert!(excluded.contains("1") && excluded.contains("6"));

    context.insert(json!({"usr.id": "admin3"}).into()).unwrap();
    let excluded = context.filter_rules(&dynamic, &mut deadline).unwrap();
    assert_eq!(excluded.len(), 9);
}

#[test]
fn test_filter_inputs_reports_exclusion_map() {
    let ruleset = input_filtered_ruleset(None);
    let query = ruleset.manifest().find("server.request.query").unwrap();
    let mut context = Context::new(Arc::clone(&ruleset));
    let dynamic = DynamicOperators::new();
    let mut deadline = Deadline::new(BUDGET);

    // Condition not met: no exclusions.
    context
        .insert(json!({"server.request.query": {"q": "trigger"}}).into())
        .unwrap();
    let exclusions = context.filter_inputs(&dynamic, &mut deadline).unwrap();
    assert!(exclusions.is_empty());

    context.insert(json!({"usr.id": "admin"}).into()).unwrap();
    let exclusions = context.filter_inputs(&dynamic, &mut deadline).unwrap();
    assert!(exclusions["1"].contains(&ObjectRef::root(query)));
}

#[test]
fn test_rule_filter_triggered_late_has_no_retroactive_effect() {
    let mut context = Context::new(filtered_ruleset());

    // No filter triggers; all nine rules fire.
    let events = context
        .run(json!({"usr.id": "nobody", "value": "trigger"}).into(), BUDGET)
        .unwrap();
    assert_eq!(events.len(), 9);

    // Filters triggering afterwards cannot retract delivered events.
    let events = context
        .run(json!({"usr.id": "admin1", "value": "trigger"}).into(), BUDGET)
        .unwrap();
    assert!(events.is_empty());
}

fn input_filtered_ruleset(key_path: Option<Vec<String>>) -> Arc<waf_engine::Ruleset> {
    let mut manifest = Manifest::new();
    let rule = exact_rule(&mut manifest, "1", "flow1", "server.request.query", "trigger");
    let condition = exact_condition(&mut manifest, "usr.id", "admin");
    let query = manifest.insert("server.request.query");

    let mut object_filter = ObjectFilter::new();
    match key_path {
        Some(path) => object_filter.insert_key_path(query, path),
        None => object_filter.insert(query),
    }
    let filter = InputFilter::new("1", vec![condition], vec!["1".to_string()], object_filter);

    let mut builder = RulesetBuilder::new(manifest);
    builder.add_rule(rule).add_input_filter(filter);
    let (ruleset, _) = builder.build().unwrap();
    Arc::new(ruleset)
}

#[test]
fn test_input_filter_hides_whole_root() {
    let ruleset = input_filtered_ruleset(None);

    // Filter condition holds: the query root is invisible to the rule.
    let mut context = Context::new(Arc::clone(&ruleset));
    let events = context
        .run(
            json!({"usr.id": "admin", "server.request.query": {"q": "trigger"}}).into(),
            BUDGET,
        )
        .unwrap();
    assert!(events.is_empty());

    // Without the admin user the rule sees the query.
    let mut context = Context::new(ruleset);
    let events = context
        .run(json!({"server.request.query": {"q": "trigger"}}).into(), BUDGET)
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].matches[0].key_path, vec!["q".to_string()]);
}

#[test]
fn test_input_filter_applies_to_roots_submitted_later() {
    let mut context = Context::new(input_filtered_ruleset(None));

    let events = context.run(json!({"usr.id": "admin"}).into(), BUDGET).unwrap();
    assert!(events.is_empty());

    // The query arrives after the filter first triggered; it is still
    // hidden because input filters are re-applied every round.
    let events = context
        .run(json!({"server.request.query": {"q": "trigger"}}).into(), BUDGET)
        .unwrap();
    assert!(events.is_empty());
}

#[test]
fn test_input_filter_key_path_hides_subtree_only() {
    let ruleset = input_filtered_ruleset(Some(vec!["secret".to_string()]));
    let mut context = Context::new(ruleset);
    let events = context
        .run(
            json!({
                "usr.id": "admin",
                "server.request.query": {"secret": "trigger", "q": "trigger"}
            })
            .into(),
            BUDGET,
        )
        .unwrap();
    // The hidden subtree cannot match, the sibling still can.
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].matches[0].key_path, vec!["q".to_string()]);
}

#[test]
fn test_timeout_keeps_pending_data_for_retry() {
    let mut manifest = Manifest::new();
    let rule = exact_rule(&mut manifest, "1", "flow1", "usr.id", "admin");
    let mut builder = RulesetBuilder::new(manifest);
    builder.add_rule(rule);
    let (ruleset, _) = builder.build().unwrap();
    let mut context = Context::new(Arc::new(ruleset));

    context.insert(json!({"usr.id": "admin"}).into()).unwrap();
    let err = context
        .evaluate(&DynamicOperators::new(), Duration::ZERO)
        .unwrap_err();
    assert_eq!(err, WafError::Timeout);

    // The aborted round left the data flagged pending; a retry with a
    // fresh budget picks it up.
    let events = context.evaluate(&DynamicOperators::new(), BUDGET).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "1");
}

#[test]
fn test_rule_without_conditions_never_fires() {
    let mut manifest = Manifest::new();
    let normal = exact_rule(&mut manifest, "1", "flow1", "usr.id", "admin");
    let vacuous = Rule {
        id: "2".to_string(),
        name: "rule-2".to_string(),
        tags: tags("flow2"),
        conditions: Vec::new(),
        actions: Vec::new(),
    };
    let mut builder = RulesetBuilder::new(manifest);
    builder.add_rule(normal).add_rule(vacuous);
    let (ruleset, info) = builder.build().unwrap();
    assert_eq!(info.loaded, 2);
    assert_eq!(info.failed, 0);

    let mut context = Context::new(Arc::new(ruleset));
    let events = context.run(json!({"usr.id": "admin"}).into(), BUDGET).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "1");
}

#[test]
fn test_sensitive_keys_redacted_in_events() {
    let mut manifest = Manifest::new();
    let rule = exact_rule(&mut manifest, "1", "flow1", "server.request.headers", "hunter2");
    let mut builder = RulesetBuilder::new(manifest);
    builder.add_rule(rule);
    let (ruleset, _) = builder.build().unwrap();

    let mut context = Context::new(Arc::new(ruleset));
    let events = context
        .run(
            json!({"server.request.headers": {"password": "hunter2"}}).into(),
            BUDGET,
        )
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].matches[0].key_path, vec!["password".to_string()]);
    assert_eq!(events[0].matches[0].resolved, REDACTION_MSG);
    assert_eq!(events[0].matches[0].matched, REDACTION_MSG);
}

#[test]
fn test_events_serialize_to_json() {
    let mut manifest = Manifest::new();
    let rule = exact_rule(&mut manifest, "1", "flow1", "usr.id", "admin");
    let mut builder = RulesetBuilder::new(manifest);
    builder.add_rule(rule);
    let (ruleset, _) = builder.build().unwrap();

    let mut context = Context::new(Arc::new(ruleset));
    let events = context.run(json!({"usr.id": "admin"}).into(), BUDGET).unwrap();
    let payload = serde_json::to_value(&events).unwrap();
    assert_eq!(payload[0]["id"], "1");
    assert_eq!(payload[0]["rule_type"], "flow1");
    assert_eq!(payload[0]["matches"][0]["operator_name"], "exact_match");
    assert_eq!(payload[0]["matches"][0]["resolved"], "admin");
}
