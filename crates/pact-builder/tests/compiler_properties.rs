//! Behavioural properties of the interaction structure compiler.

use pact_builder::generators;
use pact_builder::matchers;
use pact_builder::{
    encode, FailureReason, GeneratorDeclaration, InteractionElement, MatchingRule, Node, Path,
    Processor, RuleLogic, RuleSet, DEFAULT_MAX_DEPTH,
};
use proptest::prelude::*;
use serde_json::json;

fn body() -> Processor {
    Processor::new(InteractionElement::Body)
}

fn rules_at<'a>(rules: &'a pact_builder::rules::PathMap<RuleSet>, path: &str) -> &'a RuleSet {
    rules
        .get(&Path::from(path))
        .unwrap_or_else(|| panic!("no rules at {path}; have {:?}", rules.keys().collect::<Vec<_>>()))
}

fn nested_repetition(levels: usize) -> Node {
    (0..levels).fold(matchers::like(1), |inner, _| matchers::each_like(inner))
}

#[test]
fn test_scalars_compile_unchanged() {
    for (node, expected) in [
        (Node::from("text"), json!("text")),
        (Node::from(42), json!(42)),
        (Node::from(1.5), json!(1.5)),
        (Node::from(false), json!(false)),
        (Node::null(), json!(null)),
    ] {
        let compiled = body().process(&node, &Path::body_root(), false).unwrap();
        assert_eq!(compiled.value, expected);
        assert!(compiled.rules.is_empty());
        assert!(compiled.generators.is_empty());
    }
}

#[test]
fn test_equality_under_data_key() {
    let node = Node::mapping([("data", matchers::equal_to("x"))]);
    let compiled = body().process(&node, &Path::body_root(), false).unwrap();

    assert_eq!(compiled.rules.len(), 1);
    assert_eq!(
        rules_at(&compiled.rules, "$.data").matchers,
        vec![MatchingRule::Equality]
    );
}

#[test]
fn test_each_like_mapping_under_nested_root() {
    let node = matchers::each_like(Node::mapping([("id", matchers::like(1))]));
    let compiled = body()
        .process(&node, &Path::from("$.data.array1"), false)
        .unwrap();

    assert_eq!(
        rules_at(&compiled.rules, "$.data.array1").matchers,
        vec![MatchingRule::Type {
            min: Some(1),
            max: None
        }]
    );
    assert_eq!(
        rules_at(&compiled.rules, "$.data.array1[*].*.id").matchers,
        vec![MatchingRule::type_match()]
    );
    assert_eq!(compiled.value, json!([{"id": 1}]));
}

#[test]
fn test_includes_with_or_combine() {
    let node = Node::mapping([("text", matchers::includes(["a", "b"], RuleLogic::Or))]);
    let compiled = body().process(&node, &Path::body_root(), false).unwrap();
    let rules = rules_at(&compiled.rules, "$.text");

    assert_eq!(
        rules.matchers,
        vec![
            MatchingRule::Include { value: "a".into() },
            MatchingRule::Include { value: "b".into() },
        ]
    );
    assert_eq!(
        serde_json::to_value(rules).unwrap()["combine"],
        json!("OR")
    );
}

#[test]
fn test_date_generator_keeps_formatted_example() {
    let node = Node::mapping([("due", generators::date(Some("yyyy-MM-dd")))]);
    let compiled = body().process(&node, &Path::body_root(), false).unwrap();

    let due = compiled.value["due"].as_str().unwrap();
    assert!(chrono::NaiveDate::parse_from_str(due, "%Y-%m-%d").is_ok());
    assert_eq!(
        compiled.generators.get(&Path::from("$.due")),
        Some(&GeneratorDeclaration::Date {
            format: Some("yyyy-MM-dd".into()),
            expression: None
        })
    );
    assert_eq!(
        serde_json::to_value(&compiled.generators[&Path::from("$.due")]).unwrap(),
        json!({"type": "Date", "format": "yyyy-MM-dd"})
    );
}

#[test]
fn test_raw_timestamp_is_not_encodable() {
    let created = chrono::Utc::now();
    let node = Node::mapping([("created", Node::from(created)), ("name", Node::from("Joe"))]);
    let err = body().process(&node, &Path::body_root(), false).unwrap_err();

    assert_eq!(err.reason, FailureReason::NotEncodable);
    assert_eq!(err.path.as_str(), "$.created");
    assert!(err.to_string().contains(&created.to_rfc3339()));

    let sibling = Node::mapping([("name", Node::from("Joe"))]);
    assert!(body().process(&sibling, &Path::body_root(), false).is_ok());
}

#[test]
fn test_compilation_is_deterministic_apart_from_examples() {
    let node = Node::mapping([
        ("id", matchers::random_integer(1, 1000)),
        ("token", generators::random_string(16)),
        ("items", matchers::each_like(Node::mapping([("sku", generators::uuid(None))]))),
    ]);

    let first = encode(&node, InteractionElement::Body, DEFAULT_MAX_DEPTH).unwrap();
    let second = encode(&node, InteractionElement::Body, DEFAULT_MAX_DEPTH).unwrap();

    assert_eq!(
        serde_json::to_string(&first.rules).unwrap(),
        serde_json::to_string(&second.rules).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.generators).unwrap(),
        serde_json::to_string(&second.generators).unwrap()
    );
}

#[test]
fn test_two_level_repetition_has_two_wildcards() {
    let compiled = body()
        .process(&nested_repetition(2), &Path::body_root(), false)
        .unwrap();
    let keys: Vec<&str> = compiled.rules.keys().map(Path::as_str).collect();
    assert_eq!(keys, vec!["$", "$[*]", "$[*][*]"]);
}

#[test]
fn test_wide_repetition_does_not_duplicate_per_element() {
    let node = matchers::each_like(Node::sequence([
        matchers::like(1),
        matchers::like(2),
        matchers::like(3),
    ]));
    let compiled = body().process(&node, &Path::body_root(), false).unwrap();
    let keys: Vec<&str> = compiled.rules.keys().map(Path::as_str).collect();
    assert_eq!(keys, vec!["$", "$[*]"]);
}

proptest! {
    #[test]
    fn test_wildcards_follow_repetition_depth(levels in 1usize..8) {
        let compiled = body()
            .process(&nested_repetition(levels), &Path::body_root(), false)
            .unwrap();
        let deepest = compiled
            .rules
            .keys()
            .map(Path::wildcard_count)
            .max()
            .unwrap_or(0);
        prop_assert_eq!(deepest, levels);
        prop_assert_eq!(compiled.rules.len(), levels + 1);
    }

    #[test]
    fn test_mapping_keys_become_dotted_paths(key in "[a-z]{1,12}") {
        let node = Node::mapping([(key.clone(), matchers::like("x"))]);
        let compiled = body().process(&node, &Path::body_root(), false).unwrap();
        let expected = format!("$.{key}");
        prop_assert!(compiled.rules.contains_key(&Path::from(expected.as_str())));
    }
}
