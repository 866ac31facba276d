//! The closed set of values an interaction element is authored with.
//!
//! A [`Node`] is either plain data (scalars, sequences, mappings), a wrapper
//! that contributes matching rules and/or generators around an example value,
//! or [`Node::Invalid`] for anything that can not be encoded. Invalid nodes are
//! kept in the tree so the failure surfaces with its path when compiled.

use std::collections::{BTreeMap, HashMap};

use bigdecimal::BigDecimal;

use crate::generators::GeneratorDeclaration;
use crate::rules::{MatchingRule, RuleLogic};

/// A leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Decimal(BigDecimal),
    String(String),
}

impl Scalar {
    /// Text form used when checking examples against patterns.
    pub fn text(&self) -> String {
        match self {
            Scalar::Null => "null".to_string(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Integer(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Decimal(d) => d.to_string(),
            Scalar::String(s) => s.clone(),
        }
    }
}

/// A matcher around an example value.
#[derive(Debug, Clone, PartialEq)]
pub struct Matcher {
    pub rules: Vec<MatchingRule>,
    pub combine: Option<RuleLogic>,
    pub value: Node,
}

/// A repetition matcher: every element of the wrapped collection is matched
/// by type, with optional cardinality bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Repetition {
    pub collection: Node,
    pub min: Option<usize>,
    pub max: Option<usize>,
}

/// An array that must contain at least one element matching each variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayContains {
    pub variants: Vec<Node>,
}

/// A generator around a freshly computed example value.
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub declaration: GeneratorDeclaration,
    pub value: Node,
}

/// A node contributing both a matching rule and a generator.
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherGenerator {
    pub rule: MatchingRule,
    pub generator: GeneratorDeclaration,
    pub value: Node,
}

/// A value outside the encodable set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalid {
    pub description: String,
    /// Set when a matcher or generator was declared with unusable parameters.
    pub problem: Option<String>,
}

/// One node of an interaction element's tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Sequence(Vec<Node>),
    Mapping(BTreeMap<String, Node>),
    Matcher(Box<Matcher>),
    Repetition(Box<Repetition>),
    ArrayContains(Box<ArrayContains>),
    Generator(Box<Generator>),
    MatcherGenerator(Box<MatcherGenerator>),
    Invalid(Invalid),
}

impl Node {
    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    pub fn invalid(description: impl Into<String>) -> Self {
        Node::Invalid(Invalid {
            description: description.into(),
            problem: None,
        })
    }

    /// A declaration whose parameters can not describe a rule or generator.
    pub fn invalid_parameter(description: impl Into<String>, problem: impl Into<String>) -> Self {
        Node::Invalid(Invalid {
            description: description.into(),
            problem: Some(problem.into()),
        })
    }

    /// Build a mapping from key/value pairs.
    pub fn mapping<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Node>,
        I: IntoIterator<Item = (K, V)>,
    {
        Node::Mapping(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a sequence from values.
    pub fn sequence<V, I>(items: I) -> Self
    where
        V: Into<Node>,
        I: IntoIterator<Item = V>,
    {
        Node::Sequence(items.into_iter().map(Into::into).collect())
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Node::Invalid(_))
    }

    /// Short human-readable rendering used in error messages.
    ///
    /// Only the first few levels and members are rendered; deeper or longer
    /// collections are elided as `[...]`, `{...}` or a trailing `...`.
    pub fn describe(&self) -> String {
        self.describe_within(DESCRIBE_LEVELS)
    }

    fn describe_within(&self, levels: usize) -> String {
        match self {
            Node::Scalar(Scalar::String(s)) => format!("\"{s}\""),
            Node::Scalar(scalar) => scalar.text(),
            Node::Invalid(invalid) => invalid.description.clone(),
            Node::Sequence(_) if levels == 0 => "[...]".to_string(),
            Node::Mapping(_) if levels == 0 => "{...}".to_string(),
            Node::Sequence(items) => {
                let inner = elided(
                    items.iter().map(|item| item.describe_within(levels - 1)),
                    items.len(),
                );
                format!("[{inner}]")
            }
            Node::Mapping(members) => {
                let inner = elided(
                    members
                        .iter()
                        .map(|(k, v)| format!("\"{k}\": {}", v.describe_within(levels - 1))),
                    members.len(),
                );
                format!("{{{inner}}}")
            }
            Node::Matcher(m) => {
                let kinds: Vec<&str> = m.rules.iter().map(MatchingRule::kind).collect();
                format!("{}({})", kinds.join("+"), inner_within(&m.value, levels))
            }
            Node::Repetition(r) => format!("eachLike({})", inner_within(&r.collection, levels)),
            Node::ArrayContains(a) => format!("arrayContains({} variants)", a.variants.len()),
            Node::Generator(g) => {
                format!("{}({})", g.declaration.kind(), inner_within(&g.value, levels))
            }
            Node::MatcherGenerator(c) => format!(
                "{}+{}({})",
                c.rule.kind(),
                c.generator.kind(),
                inner_within(&c.value, levels)
            ),
        }
    }
}

const DESCRIBE_LEVELS: usize = 4;
const DESCRIBE_MEMBERS: usize = 8;

fn inner_within(node: &Node, levels: usize) -> String {
    match levels {
        0 => "...".to_string(),
        _ => node.describe_within(levels - 1),
    }
}

fn elided(parts: impl Iterator<Item = String>, len: usize) -> String {
    let mut shown: Vec<String> = parts.take(DESCRIBE_MEMBERS).collect();
    if len > DESCRIBE_MEMBERS {
        shown.push("...".to_string());
    }
    shown.join(", ")
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Node::Scalar(value)
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::Scalar(Scalar::String(value))
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Scalar(Scalar::Bool(value))
    }
}

macro_rules! integer_node {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Node {
                fn from(value: $ty) -> Self {
                    Node::Scalar(Scalar::Integer(i64::from(value)))
                }
            }
        )*
    };
}

integer_node!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Node {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Node::Scalar(Scalar::Integer(i)),
            Err(_) => Node::Scalar(Scalar::Decimal(BigDecimal::from(value))),
        }
    }
}

impl From<usize> for Node {
    fn from(value: usize) -> Self {
        Node::from(value as u64)
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        if value.is_finite() {
            Node::Scalar(Scalar::Float(value))
        } else {
            Node::invalid(value.to_string())
        }
    }
}

impl From<f32> for Node {
    fn from(value: f32) -> Self {
        Node::from(f64::from(value))
    }
}

impl From<BigDecimal> for Node {
    fn from(value: BigDecimal) -> Self {
        Node::Scalar(Scalar::Decimal(value))
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Node::null, Into::into)
    }
}

impl<T: Into<Node>> From<Vec<T>> for Node {
    fn from(value: Vec<T>) -> Self {
        Node::sequence(value)
    }
}

impl<K: Into<String>, T: Into<Node>> From<BTreeMap<K, T>> for Node {
    fn from(value: BTreeMap<K, T>) -> Self {
        Node::mapping(value)
    }
}

impl<K: Into<String>, T: Into<Node>> From<HashMap<K, T>> for Node {
    fn from(value: HashMap<K, T>) -> Self {
        Node::mapping(value)
    }
}

// Dates and times have no canonical JSON form; they must be wrapped in a
// date/time matcher or generator that names the format.
impl<Tz: chrono::TimeZone> From<chrono::DateTime<Tz>> for Node
where
    Tz::Offset: std::fmt::Display,
{
    fn from(value: chrono::DateTime<Tz>) -> Self {
        Node::invalid(value.to_rfc3339())
    }
}

impl From<chrono::NaiveDate> for Node {
    fn from(value: chrono::NaiveDate) -> Self {
        Node::invalid(value.to_string())
    }
}

impl From<chrono::NaiveDateTime> for Node {
    fn from(value: chrono::NaiveDateTime) -> Self {
        Node::invalid(value.to_string())
    }
}

/// Plain JSON carries no wrappers; numbers keep their precision.
impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Node::null(),
            serde_json::Value::Bool(b) => Node::from(b),
            serde_json::Value::Number(n) => number_node(&n),
            serde_json::Value::String(s) => Node::from(s),
            serde_json::Value::Array(items) => Node::sequence(items),
            serde_json::Value::Object(members) => Node::mapping(members),
        }
    }
}

pub(crate) fn number_node(number: &serde_json::Number) -> Node {
    if let Some(i) = number.as_i64() {
        return Node::from(i);
    }
    let text = number.to_string();
    if !text.contains(['.', 'e', 'E']) {
        if let Ok(decimal) = text.parse::<BigDecimal>() {
            return Node::from(decimal);
        }
    }
    match number.as_f64() {
        Some(f) if f.to_string() == text => Node::from(f),
        _ => text
            .parse::<BigDecimal>()
            .map_or_else(|_| Node::invalid(text.clone()), Node::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_scalars_convert() {
        assert_eq!(Node::from("a"), Node::Scalar(Scalar::String("a".into())));
        assert_eq!(Node::from(3u8), Node::Scalar(Scalar::Integer(3)));
        assert_eq!(Node::from(true), Node::Scalar(Scalar::Bool(true)));
        assert_eq!(Node::from(None::<i32>), Node::null());
    }

    #[test]
    fn test_non_finite_float_is_invalid() {
        assert!(Node::from(f64::NAN).is_invalid());
        assert!(Node::from(f64::INFINITY).is_invalid());
        assert!(!Node::from(1.5).is_invalid());
    }

    #[test]
    fn test_large_unsigned_becomes_decimal() {
        match Node::from(u64::MAX) {
            Node::Scalar(Scalar::Decimal(d)) => assert_eq!(d.to_string(), u64::MAX.to_string()),
            other => panic!("expected decimal, got {other:?}"),
        }
    }

    #[test]
    fn test_raw_timestamp_is_invalid() {
        let ts = chrono::Utc.with_ymd_and_hms(2021, 5, 17, 10, 0, 0).unwrap();
        let node = Node::from(ts);
        assert!(node.is_invalid());
        assert!(node.describe().starts_with("2021-05-17T10:00:00"));
    }

    #[test]
    fn test_plain_json_converts_structurally() {
        let node = Node::from(json!({"a": [1, "two", null], "b": {"c": false}}));
        let expected = Node::mapping([
            (
                "a",
                Node::sequence([Node::from(1), Node::from("two"), Node::null()]),
            ),
            ("b", Node::mapping([("c", false)])),
        ]);
        assert_eq!(node, expected);
    }

    #[test]
    fn test_describe_renders_nested_values() {
        let node = Node::mapping([("ids", Node::sequence([1, 2]))]);
        assert_eq!(node.describe(), "{\"ids\": [1, 2]}");
    }

    #[test]
    fn test_describe_elides_deep_and_wide_collections() {
        let mut deep = Node::from(1);
        for _ in 0..6 {
            deep = Node::sequence([deep]);
        }
        assert_eq!(deep.describe(), "[[[[[...]]]]]");

        let wide = Node::sequence(0..20);
        assert_eq!(wide.describe(), "[0, 1, 2, 3, 4, 5, 6, 7, ...]");
    }
}
