//! Builder operations: events, flags, validation and export/import

mod common;

use common::{assert_levels, builder, builder_with, dropped, record, sample_filters};
use querytree_core::tree::NodeField;
use querytree_core::{
    AllowGroups, BuilderConfig, Condition, CoreError, FilterConfig, Flags, FlagsExport,
    GetRulesOptions, GroupData, QueryBuilder, QueryEvent, RuleData, SetRulesOptions,
    ValidateOptions, ValidationError,
};
use serde_json::{json, Value};

/// root(AND): age between [18, 30], name = "bob" {data}, (OR: price < 9.5, active = true)
fn populated() -> QueryBuilder {
    let mut qb = builder();
    let root = qb.root();

    let age = qb.add_rule(root, None, None).unwrap().unwrap();
    qb.set_rule_filter(age, Some("age")).unwrap();
    qb.set_rule_operator(age, Some("between")).unwrap();
    qb.set_rule_value(age, json!([18, 30])).unwrap();

    let name = qb.add_rule(root, None, None).unwrap().unwrap();
    qb.set_rule_filter(name, Some("name")).unwrap();
    qb.set_rule_value(name, json!("bob")).unwrap();
    qb.set_data(name, Some(json!({"source": "crm"}))).unwrap();

    let group = qb.add_group(root, false, None, None).unwrap().unwrap();
    qb.set_group_condition(group, Condition::Or).unwrap();
    let price = qb.add_rule(group, None, None).unwrap().unwrap();
    qb.set_rule_filter(price, Some("price")).unwrap();
    qb.set_rule_operator(price, Some("less")).unwrap();
    qb.set_rule_value(price, json!(9.5)).unwrap();
    let active = qb.add_rule(group, None, None).unwrap().unwrap();
    qb.set_rule_filter(active, Some("active")).unwrap();
    qb.set_rule_value(active, json!(true)).unwrap();

    qb
}

// =============================================================================
// Structural refusals and cancellation
// =============================================================================

#[test]
fn test_delete_no_delete_rule_is_refused() {
    let mut qb = builder();
    let root = qb.root();
    let flags = Flags::from([("no_delete", true)]);
    let rule = qb.add_rule(root, None, Some(&flags)).unwrap().unwrap();
    let events = record(&mut qb);

    assert!(!qb.delete_rule(rule).unwrap());
    assert!(qb.model().contains(rule));
    assert_eq!(qb.model().group(root).unwrap().children(), &[rule]);
    assert!(dropped(&events.borrow()).is_empty());
}

#[test]
fn test_prevented_add_group_returns_none() {
    let mut qb = builder();
    let root = qb.root();
    qb.on("before_add_group", |signal| signal.prevent_default());

    assert_eq!(qb.add_group(root, true, None, None).unwrap(), None);
    assert!(qb.model().group(root).unwrap().is_empty());
}

#[test]
fn test_prevented_add_rule_and_after_event() {
    let mut qb = builder();
    let root = qb.root();
    let events = record(&mut qb);

    let rule = qb.add_rule(root, None, None).unwrap().unwrap();
    assert_eq!(
        *events.borrow(),
        vec![
            QueryEvent::BeforeAddRule { parent: root },
            QueryEvent::Add {
                parent: root,
                node: rule,
                index: 0,
            },
            QueryEvent::AfterAddRule { rule },
            QueryEvent::RulesChanged,
        ]
    );

    qb.on("before_add_rule", |signal| signal.prevent_default());
    assert_eq!(qb.add_rule(root, None, None).unwrap(), None);
    assert_eq!(qb.model().group(root).unwrap().len(), 1);
}

#[test]
fn test_delete_group_events_and_order() {
    let mut qb = builder();
    let root = qb.root();
    let group = qb.add_group(root, false, None, None).unwrap().unwrap();
    let a = qb.add_rule(group, None, None).unwrap().unwrap();
    let b = qb.add_rule(group, None, None).unwrap().unwrap();
    let events = record(&mut qb);

    assert!(qb.delete_group(group).unwrap());
    assert_eq!(
        *events.borrow(),
        vec![
            QueryEvent::BeforeDeleteGroup { group },
            QueryEvent::BeforeDeleteRule { rule: b },
            QueryEvent::BeforeDeleteRule { rule: a },
            QueryEvent::Drop {
                node: b,
                parent: Some(group),
                kind: querytree_core::NodeKind::Rule,
            },
            QueryEvent::Drop {
                node: a,
                parent: Some(group),
                kind: querytree_core::NodeKind::Rule,
            },
            QueryEvent::Drop {
                node: group,
                parent: Some(root),
                kind: querytree_core::NodeKind::Group,
            },
            QueryEvent::AfterDeleteRule { rule: b },
            QueryEvent::AfterDeleteRule { rule: a },
            QueryEvent::AfterDeleteGroup { group },
            QueryEvent::RulesChanged,
        ]
    );
}

#[test]
fn test_delete_group_is_all_or_nothing() {
    let mut qb = builder();
    let root = qb.root();
    let group = qb.add_group(root, false, None, None).unwrap().unwrap();
    let sub = qb.add_group(group, false, None, None).unwrap().unwrap();
    qb.add_rule(sub, None, None).unwrap();
    qb.add_rule(group, None, Some(&Flags::from([("no_delete", true)]))).unwrap();
    let count = qb.model().node_count();
    let events = record(&mut qb);

    assert!(!qb.delete_group(group).unwrap());
    assert_eq!(qb.model().node_count(), count);
    assert!(dropped(&events.borrow()).is_empty());
}

#[test]
fn test_delete_group_prevented_on_descendant() {
    let mut qb = builder();
    let root = qb.root();
    let group = qb.add_group(root, true, None, None).unwrap().unwrap();
    let count = qb.model().node_count();
    qb.on("before_delete_rule", |signal| signal.prevent_default());

    assert!(!qb.delete_group(group).unwrap());
    assert_eq!(qb.model().node_count(), count);
}

#[test]
fn test_root_cannot_be_deleted_or_moved() {
    let mut qb = builder();
    let root = qb.root();
    let group = qb.add_group(root, false, None, None).unwrap().unwrap();
    assert!(!qb.delete_group(root).unwrap());
    assert!(!qb.move_node(root, group, 0).unwrap());
}

#[test]
fn test_allow_groups_depth() {
    let mut qb = builder_with(
        BuilderConfig::new(sample_filters()).with_allow_groups(AllowGroups::MaxDepth(1)),
    );
    let root = qb.root();
    let group = qb.add_group(root, false, None, None).unwrap().unwrap();
    assert_eq!(qb.add_group(group, false, None, None).unwrap(), None);

    let mut qb = builder_with(
        BuilderConfig::new(sample_filters()).with_allow_groups(AllowGroups::Enabled(false)),
    );
    let root = qb.root();
    assert_eq!(qb.add_group(root, false, None, None).unwrap(), None);
}

#[test]
fn test_readonly_group_refuses_children() {
    let mut qb = builder();
    let root = qb.root();
    let flags = qb.flag_resolver().parse_group_flags(true, None);
    let group = qb.add_group(root, false, None, Some(&flags)).unwrap().unwrap();
    assert_eq!(qb.add_rule(group, None, None).unwrap(), None);
    assert_eq!(qb.add_group(group, false, None, None).unwrap(), None);
}

#[test]
fn test_reset_and_clear() {
    let mut qb = populated();
    let root = qb.root();
    qb.set_group_condition(root, Condition::Or).unwrap();

    assert!(qb.reset().unwrap());
    assert_eq!(qb.root(), root);
    let group = qb.model().group(root).unwrap();
    assert_eq!(group.len(), 1);
    assert_eq!(group.condition(), Condition::And);
    assert_eq!(qb.model().node_count(), 2);

    assert!(qb.clear().unwrap());
    assert_ne!(qb.root(), root);
    assert!(qb.model().group(qb.root()).unwrap().is_empty());
    assert_eq!(qb.model().node_count(), 1);

    qb.on("before_clear", |signal| signal.prevent_default());
    let root = qb.root();
    assert!(!qb.clear().unwrap());
    assert_eq!(qb.root(), root);
}

// =============================================================================
// Field cascades
// =============================================================================

#[test]
fn test_new_rule_filter_preselection() {
    let mut qb = builder_with(BuilderConfig::new(sample_filters()).display_empty_filter(false));
    let root = qb.root();
    let rule = qb.add_rule(root, None, None).unwrap().unwrap();
    assert_eq!(qb.model().rule(rule).unwrap().filter_id(), Some("name"));

    let mut qb = builder_with(BuilderConfig::new(sample_filters()).with_default_filter("age"));
    let root = qb.root();
    let rule = qb.add_rule(root, None, None).unwrap().unwrap();
    let current = qb.model().rule(rule).unwrap();
    assert_eq!(current.filter_id(), Some("age"));
    assert_eq!(current.operator_type(), Some("equal"));

    let mut qb = builder();
    let root = qb.root();
    let rule = qb.add_rule(root, None, None).unwrap().unwrap();
    assert_eq!(qb.model().rule(rule).unwrap().filter_id(), None);
}

#[test]
fn test_unknown_filter_lookup() {
    let mut qb = builder();
    let root = qb.root();
    let rule = qb.add_rule(root, None, None).unwrap().unwrap();
    assert!(matches!(
        qb.set_rule_filter(rule, Some("nope")),
        Err(CoreError::LookupError(_))
    ));
    qb.set_rule_filter(rule, Some("age")).unwrap();
    qb.set_rule_filter(rule, Some("-1")).unwrap();
    let current = qb.model().rule(rule).unwrap();
    assert_eq!(current.filter_id(), None);
    assert_eq!(current.operator_type(), None);
}

#[test]
fn test_disallowed_condition() {
    let config = BuilderConfig::new(sample_filters()).with_conditions(vec![Condition::And]);
    let mut qb = builder_with(config);
    let root = qb.root();
    assert!(matches!(
        qb.set_group_condition(root, Condition::Or),
        Err(CoreError::InvalidOperation(_))
    ));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_reversed_between_on_integer() {
    let mut qb = builder();
    let root = qb.root();
    let rule = qb.add_rule(root, None, None).unwrap().unwrap();
    qb.set_rule_filter(rule, Some("age")).unwrap();
    qb.set_rule_operator(rule, Some("between")).unwrap();

    let error = qb.validate_value(rule, &json!([30, 10])).unwrap().unwrap_err();
    assert_eq!(error.code, "integer_between_invalid");
    assert_eq!(error.args, vec![json!(30), json!(10)]);
}

#[test]
fn test_two_selections_on_single_operator() {
    let mut qb = builder();
    let root = qb.root();
    let rule = qb.add_rule(root, None, None).unwrap().unwrap();
    qb.set_rule_filter(rule, Some("name")).unwrap();

    let error = qb.validate_value(rule, &json!(["a", "b"])).unwrap().unwrap_err();
    assert_eq!(error.code, "operator_not_multiple");
}

#[test]
fn test_boolean_tokens() {
    let mut qb = builder();
    let root = qb.root();
    let rule = qb.add_rule(root, None, None).unwrap().unwrap();
    qb.set_rule_filter(rule, Some("active")).unwrap();

    assert!(qb.validate_value(rule, &json!("TRUE")).unwrap().is_ok());
    let error = qb.validate_value(rule, &json!("yes")).unwrap().unwrap_err();
    assert_eq!(error.code, "boolean_not_valid");
}

#[test]
fn test_validate_value_is_idempotent() {
    let mut qb = builder();
    let root = qb.root();
    let rule = qb.add_rule(root, None, None).unwrap().unwrap();
    qb.set_rule_filter(rule, Some("age")).unwrap();

    for value in [json!(42), json!(200), json!("x"), Value::Null] {
        let first = qb.validate_value(rule, &value).unwrap();
        let second = qb.validate_value(rule, &value).unwrap();
        assert_eq!(first, second);
    }
    assert_eq!(qb.model().rule(rule).unwrap().value(), &Value::Null);
}

#[test]
fn test_validate_tree_marks_errors() {
    let mut qb = builder();
    let root = qb.root();
    let empty_rule = qb.add_rule(root, None, None).unwrap().unwrap();
    let age = qb.add_rule(root, None, None).unwrap().unwrap();
    qb.set_rule_filter(age, Some("age")).unwrap();
    qb.set_rule_value(age, json!(500)).unwrap();
    let group = qb.add_group(root, false, None, None).unwrap().unwrap();
    let events = record(&mut qb);

    assert!(!qb.validate(ValidateOptions::default()).unwrap());
    let errors = qb.errors().unwrap();
    assert_eq!(
        errors,
        vec![
            (empty_rule, ValidationError::new("no_filter")),
            (age, ValidationError::new("number_exceed_max").with_arg(120)),
            (group, ValidationError::new("empty_group")),
        ]
    );
    let failures = events
        .borrow()
        .iter()
        .filter(|e| matches!(e, QueryEvent::ValidationFailed { .. }))
        .count();
    assert_eq!(failures, 3);

    // fixing the tree clears stored errors
    qb.delete_rule(empty_rule).unwrap();
    qb.delete_group(group).unwrap();
    qb.set_rule_value(age, json!(50)).unwrap();
    assert!(qb.validate(ValidateOptions::default()).unwrap());
    assert!(qb.errors().unwrap().is_empty());
}

#[test]
fn test_editing_a_rule_clears_its_error() {
    let mut qb = builder();
    let root = qb.root();
    let age = qb.add_rule(root, None, None).unwrap().unwrap();
    qb.set_rule_filter(age, Some("age")).unwrap();
    qb.set_rule_value(age, json!(500)).unwrap();
    assert!(!qb.validate(ValidateOptions::default()).unwrap());
    assert!(qb.model().node(age).unwrap().error().is_some());

    let events = record(&mut qb);
    qb.set_rule_value(age, json!(50)).unwrap();
    assert!(qb.model().node(age).unwrap().error().is_none());
    assert!(qb.errors().unwrap().is_empty());
    assert!(events.borrow().contains(&QueryEvent::Update {
        node: age,
        field: NodeField::Error,
    }));

    qb.set_rule_value(age, json!(500)).unwrap();
    assert!(!qb.validate(ValidateOptions::default()).unwrap());
    qb.set_rule_operator(age, Some("is_null")).unwrap();
    assert!(qb.model().node(age).unwrap().error().is_none());

    // an operator with the same shape keeps the value but still clears the error
    qb.set_rule_operator(age, Some("equal")).unwrap();
    qb.set_rule_value(age, json!(500)).unwrap();
    assert!(!qb.validate(ValidateOptions::default()).unwrap());
    qb.set_rule_operator(age, Some("not_equal")).unwrap();
    assert_eq!(qb.model().rule(age).unwrap().value(), &json!(500));
    assert!(qb.model().node(age).unwrap().error().is_none());
}

#[test]
fn test_adding_a_child_clears_empty_group_error() {
    let mut qb = builder();
    let root = qb.root();
    let first = qb.add_group(root, false, None, None).unwrap().unwrap();
    let second = qb.add_group(root, false, None, None).unwrap().unwrap();
    assert!(!qb.validate(ValidateOptions::default()).unwrap());
    assert_eq!(
        qb.model().node(first).unwrap().error(),
        Some(&ValidationError::new("empty_group"))
    );

    let rule = qb.add_rule(first, None, None).unwrap().unwrap();
    assert!(qb.model().node(first).unwrap().error().is_none());

    qb.add_group(second, false, None, None).unwrap().unwrap();
    assert!(qb.model().node(second).unwrap().error().is_none());

    let third = qb.add_group(root, false, None, None).unwrap().unwrap();
    assert!(!qb.validate(ValidateOptions::default()).unwrap());
    assert!(qb.model().node(third).unwrap().error().is_some());
    assert!(qb.move_node(rule, third, 0).unwrap());
    assert!(qb.model().node(third).unwrap().error().is_none());
}

#[test]
fn test_reversed_not_between_on_integer() {
    let mut qb = builder();
    let root = qb.root();
    let rule = qb.add_rule(root, None, None).unwrap().unwrap();
    qb.set_rule_filter(rule, Some("age")).unwrap();
    qb.set_rule_operator(rule, Some("not_between")).unwrap();

    let error = qb.validate_value(rule, &json!([30, 10])).unwrap().unwrap_err();
    assert_eq!(error.code, "integer_between_invalid");
    assert_eq!(error.args, vec![json!(30), json!(10)]);
    assert!(qb.validate_value(rule, &json!([10, 30])).unwrap().is_ok());
}

#[test]
fn test_datetime_range_order() {
    let mut filters = sample_filters();
    filters.push(FilterConfig::new("seen", "datetime"));
    let mut qb = builder_with(BuilderConfig::new(filters));
    let root = qb.root();
    let rule = qb.add_rule(root, None, None).unwrap().unwrap();
    qb.set_rule_filter(rule, Some("seen")).unwrap();
    qb.set_rule_operator(rule, Some("between")).unwrap();

    let reversed = json!(["2024-05-01 10:00:00", "2024-05-01 09:30:00"]);
    let error = qb.validate_value(rule, &reversed).unwrap().unwrap_err();
    assert_eq!(error.code, "datetime_between_invalid");
    assert_eq!(
        error.args,
        vec![json!("2024-05-01 10:00:00"), json!("2024-05-01 09:30:00")]
    );

    let ordered = json!(["2024-05-01 09:30:00", "2024-05-01 10:00:00"]);
    assert!(qb.validate_value(rule, &ordered).unwrap().is_ok());

    qb.set_rule_operator(rule, Some("not_between")).unwrap();
    let error = qb.validate_value(rule, &reversed).unwrap().unwrap_err();
    assert_eq!(error.code, "datetime_between_invalid");

    let malformed = json!(["yesterday", "2024-05-01 10:00:00"]);
    let error = qb.validate_value(rule, &malformed).unwrap().unwrap_err();
    assert_eq!(error.code, "datetime_invalid");
}

#[test]
fn test_skip_empty_validation() {
    let mut qb = builder();
    let root = qb.root();
    qb.add_rule(root, None, None).unwrap();
    let group = qb.add_group(root, true, None, None).unwrap().unwrap();
    let age = qb.add_rule(group, None, None).unwrap().unwrap();
    qb.set_rule_filter(age, Some("age")).unwrap();
    let name = qb.add_rule(root, None, None).unwrap().unwrap();
    qb.set_rule_filter(name, Some("name")).unwrap();
    qb.set_rule_value(name, json!("ann")).unwrap();

    assert!(!qb.validate(ValidateOptions::default()).unwrap());
    assert!(qb.validate(ValidateOptions { skip_empty: true }).unwrap());

    let rules = qb
        .get_rules(GetRulesOptions {
            skip_empty: true,
            ..Default::default()
        })
        .unwrap()
        .unwrap();
    assert_eq!(rules.rules.len(), 1);
    assert_eq!(rules.rules[0].as_rule().unwrap().id, "name");
}

#[test]
fn test_allow_empty_root() {
    let mut qb = builder();
    assert!(!qb.validate(ValidateOptions::default()).unwrap());

    let mut qb = builder_with(BuilderConfig::new(sample_filters()).allow_empty(true));
    assert!(qb.validate(ValidateOptions::default()).unwrap());
}

// =============================================================================
// Export / import
// =============================================================================

#[test]
fn test_export_shape() {
    let mut qb = populated();
    let rules = qb.get_rules(GetRulesOptions::default()).unwrap().unwrap();
    assert_eq!(
        serde_json::to_value(&rules).unwrap(),
        json!({
            "condition": "AND",
            "rules": [
                {"id": "age", "field": "age", "type": "integer", "input": "number",
                 "operator": "between", "value": [18, 30]},
                {"id": "name", "field": "name", "type": "string", "input": "text",
                 "operator": "equal", "value": "bob", "data": {"source": "crm"}},
                {"condition": "OR", "rules": [
                    {"id": "price", "field": "price", "type": "double", "input": "number",
                     "operator": "less", "value": 9.5},
                    {"id": "active", "field": "active", "type": "boolean", "input": "text",
                     "operator": "equal", "value": true}
                ]}
            ],
            "valid": true
        })
    );
}

#[test]
fn test_round_trip() -> anyhow::Result<()> {
    let mut source = populated();
    let exported = source.get_rules(GetRulesOptions::default())?.unwrap();

    let mut target = builder();
    assert!(target.set_rules(&exported, SetRulesOptions::default())?);
    assert_levels(target.model());
    let reexported = target.get_rules(GetRulesOptions::default())?.unwrap();

    assert_eq!(exported, reexported);
    Ok(())
}

#[test]
fn test_invalid_tree_exports_nothing() {
    let mut qb = builder();
    let root = qb.root();
    qb.add_rule(root, None, None).unwrap();

    assert_eq!(qb.get_rules(GetRulesOptions::default()).unwrap(), None);
    let rules = qb
        .get_rules(GetRulesOptions {
            allow_invalid: true,
            ..Default::default()
        })
        .unwrap()
        .unwrap();
    assert_eq!(rules.valid, Some(false));
    assert_eq!(rules.rules[0].as_rule().unwrap().id, "-1");
}

#[test]
fn test_flags_export_modes() {
    let mut qb = builder();
    let root = qb.root();
    let rule = qb
        .add_rule(root, None, Some(&Flags::from([("value_readonly", true)])))
        .unwrap()
        .unwrap();
    qb.set_rule_filter(rule, Some("name")).unwrap();
    qb.set_rule_value(rule, json!("x")).unwrap();

    let diff = qb
        .get_rules(GetRulesOptions {
            flags: FlagsExport::Diff,
            ..Default::default()
        })
        .unwrap()
        .unwrap();
    assert_eq!(diff.flags, None);
    let exported = diff.rules[0].as_rule().unwrap();
    assert_eq!(exported.flags, Some(Flags::from([("value_readonly", true)])));

    let all = qb
        .get_rules(GetRulesOptions {
            flags: FlagsExport::All,
            ..Default::default()
        })
        .unwrap()
        .unwrap();
    assert_eq!(all.flags.as_ref().map(Flags::len), Some(4));
}

#[test]
fn test_import_unknown_filter_is_fatal_and_atomic() {
    let mut qb = populated();
    let root = qb.root();
    let count = qb.model().node_count();
    let data = GroupData::new("AND")
        .with_rule(RuleData::new("name", "equal", json!("x")))
        .with_rule(RuleData::new("missing", "equal", json!(1)));

    let result = qb.set_rules(&data, SetRulesOptions::default());
    assert!(matches!(result, Err(CoreError::ConfigError(_))));
    assert_eq!(qb.root(), root);
    assert_eq!(qb.model().node_count(), count);
}

#[test]
fn test_import_tolerates_unknown_references_when_allowed() {
    let mut qb = builder();
    let data = GroupData::new("XOR")
        .with_rule(RuleData::new("missing", "equal", json!(1)))
        .with_rule(RuleData::new("name", "between", json!(["a", "b"])));

    let options = SetRulesOptions {
        allow_invalid: true,
    };
    assert!(qb.set_rules(&data, options).unwrap());
    let root = qb.root();
    let group = qb.model().group(root).unwrap();
    assert_eq!(group.condition(), Condition::And);
    let first = qb.model().rule(group.children()[0]).unwrap();
    assert_eq!(first.filter_id(), None);
    let second = qb.model().rule(group.children()[1]).unwrap();
    assert_eq!(second.filter_id(), Some("name"));
    assert_eq!(second.operator_type(), None);
}

#[test]
fn test_import_applies_readonly_and_data() {
    let mut qb = builder();
    let data = GroupData::new("OR")
        .with_data(json!({"saved": 1}))
        .with_rule(RuleData::new("name", "is_null", Value::Null).readonly())
        .with_rule(
            GroupData::new("AND")
                .readonly()
                .with_rule(RuleData::new("age", "equal", json!(3))),
        );

    assert!(qb.set_rules(&data, SetRulesOptions::default()).unwrap());
    let root = qb.root();
    assert_eq!(qb.model().node(root).unwrap().data(), Some(&json!({"saved": 1})));

    let children = qb.model().group(root).unwrap().children().to_vec();
    let rule_flags = qb.get_flags(children[0], true).unwrap();
    assert!(rule_flags.no_delete());
    assert!(rule_flags.get("value_readonly"));
    let group_flags = qb.get_flags(children[1], false).unwrap();
    assert!(group_flags.no_add_rule());
    assert!(!qb.delete_rule(children[0]).unwrap());
}

#[test]
fn test_import_defaults_missing_operator() {
    let mut qb = builder();
    let data = GroupData::new("AND").with_rule(RuleData {
        id: "age".to_string(),
        value: json!(7),
        ..Default::default()
    });
    qb.set_rules(&data, SetRulesOptions::default()).unwrap();
    let root = qb.root();
    let rule = qb.model().group(root).unwrap().children()[0];
    assert_eq!(qb.model().rule(rule).unwrap().operator_type(), Some("equal"));
}

#[test]
fn test_import_respects_group_depth() {
    let mut qb = builder_with(
        BuilderConfig::new(sample_filters()).with_allow_groups(AllowGroups::MaxDepth(1)),
    );
    let nested = GroupData::new("AND").with_rule(
        GroupData::new("OR").with_rule(
            GroupData::new("AND").with_rule(RuleData::new("name", "equal", json!("x"))),
        ),
    );
    assert!(matches!(
        qb.set_rules(&nested, SetRulesOptions::default()),
        Err(CoreError::ConfigError(_))
    ));
}

#[test]
fn test_prevented_set_rules() {
    let mut qb = populated();
    let root = qb.root();
    qb.on("before_set_rules", |signal| signal.prevent_default());
    let data = GroupData::new("AND").with_rule(RuleData::new("name", "equal", json!("x")));
    assert!(!qb.set_rules(&data, SetRulesOptions::default()).unwrap());
    assert_eq!(qb.root(), root);
}

#[test]
fn test_import_empty_rules() {
    let mut qb = builder();
    assert!(matches!(
        qb.set_rules(&GroupData::new("AND"), SetRulesOptions::default()),
        Err(CoreError::ConfigError(_))
    ));

    let mut qb = builder_with(BuilderConfig::new(sample_filters()).allow_empty(true));
    assert!(qb.set_rules(&GroupData::new("AND"), SetRulesOptions::default()).unwrap());
}
