//! Matcher and matcher+generator constructors.
//!
//! Every constructor returns a [`Node`]. Parameters that can not describe a
//! rule (an inverted cardinality, an unknown date pattern letter) produce a
//! [`Node::Invalid`] so the failure is reported with its path when the tree
//! is compiled. Patterns are checked against their examples at compile time.

use crate::generators::{self, GeneratorDeclaration, UuidFormat, MAX_DECIMAL_DIGITS};
use crate::node::{ArrayContains, Matcher, MatcherGenerator, Node, Repetition, Scalar};
use crate::rules::{HttpStatus, MatchingRule, RuleLogic, StatusCodeRange};

pub const IP4_ADDRESS: &str = r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$";
pub const IP6_ADDRESS: &str = r"^(([0-9a-fA-F]{1,4}:){7,7}[0-9a-fA-F]{1,4}|([0-9a-fA-F]{1,4}:){1,7}:|([0-9a-fA-F]{1,4}:){1,6}:[0-9a-fA-F]{1,4}|([0-9a-fA-F]{1,4}:){1,5}(:[0-9a-fA-F]{1,4}){1,2}|([0-9a-fA-F]{1,4}:){1,4}(:[0-9a-fA-F]{1,4}){1,3}|([0-9a-fA-F]{1,4}:){1,3}(:[0-9a-fA-F]{1,4}){1,4}|([0-9a-fA-F]{1,4}:){1,2}(:[0-9a-fA-F]{1,4}){1,5}|[0-9a-fA-F]{1,4}:((:[0-9a-fA-F]{1,4}){1,6})|:((:[0-9a-fA-F]{1,4}){1,7}|:)|fe80:(:[0-9a-fA-F]{0,4}){0,4}%[0-9a-zA-Z]{1,}|::(ffff(:0{1,4}){0,1}:){0,1}((25[0-5]|(2[0-4]|1{0,1}[0-9]){0,1}[0-9])\.){3,3}(25[0-5]|(2[0-4]|1{0,1}[0-9]){0,1}[0-9])|([0-9a-fA-F]{1,4}:){1,4}:((25[0-5]|(2[0-4]|1{0,1}[0-9]){0,1}[0-9])\.){3,3}(25[0-5]|(2[0-4]|1{0,1}[0-9]){0,1}[0-9]))$";
pub const HEXADECIMAL: &str = r"^(?:0x)?[0-9a-fA-F]+$";
pub const BASE64: &str = r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$";
pub const UUID: &str = r"^[0-9a-fA-F]{8}(-[0-9a-fA-F]{4}){3}-[0-9a-fA-F]{12}$";

fn with_rules(
    rules: Vec<MatchingRule>,
    combine: Option<RuleLogic>,
    value: impl Into<Node>,
) -> Node {
    Node::Matcher(Box::new(Matcher {
        rules,
        combine,
        value: value.into(),
    }))
}

fn with_rule(rule: MatchingRule, value: impl Into<Node>) -> Node {
    with_rules(vec![rule], None, value)
}

fn with_generator(
    rule: MatchingRule,
    generator: GeneratorDeclaration,
    value: impl Into<Node>,
) -> Node {
    Node::MatcherGenerator(Box::new(MatcherGenerator {
        rule,
        generator,
        value: value.into(),
    }))
}

/// Rejects date/time patterns chrono can not render.
fn checked_format(kind: &str, value: &str, format: &str) -> Result<(), Node> {
    generators::to_strftime(format)
        .map(|_| ())
        .map_err(|problem| Node::invalid_parameter(format!("{kind}(\"{value}\")"), problem))
}

// Type and value matchers

/// Matches by type; the example's value is not compared.
pub fn like(value: impl Into<Node>) -> Node {
    with_rule(MatchingRule::type_match(), value)
}

/// Matches by equality with the example.
pub fn equal_to(value: impl Into<Node>) -> Node {
    with_rule(MatchingRule::Equality, value)
}

pub fn integer(value: i64) -> Node {
    with_rule(MatchingRule::Integer, value)
}

/// A number with a fractional part. Takes floats or decimals.
pub fn decimal(value: impl Into<Node>) -> Node {
    with_rule(MatchingRule::Decimal, value)
}

pub fn number(value: impl Into<Node>) -> Node {
    with_rule(MatchingRule::Number, value)
}

pub fn null() -> Node {
    with_rule(MatchingRule::Null, Node::null())
}

pub fn boolean(value: bool) -> Node {
    with_rule(MatchingRule::Boolean, value)
}

/// Any non-empty value of the example's type.
pub fn not_empty(value: impl Into<Node>) -> Node {
    with_rule(MatchingRule::NotEmpty, value)
}

pub fn semver(value: &str) -> Node {
    with_rule(MatchingRule::Semver, value)
}

// Pattern matchers

/// Matches strings against `pattern`. The example must match it.
pub fn regex(pattern: &str, example: &str) -> Node {
    with_rule(
        MatchingRule::Regex {
            regex: pattern.to_string(),
        },
        example,
    )
}

/// Matches exactly one of `values`. The first value is the example.
pub fn one_of<I, T>(values: I) -> Node
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    let values: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
    let Some(first) = values.first() else {
        return Node::invalid_parameter("oneOf()", "at least one value is required");
    };
    let alternatives: Vec<String> = values.iter().map(|v| regex::escape(v)).collect();
    regex(&format!("^({})$", alternatives.join("|")), first)
}

pub fn ip4_address() -> Node {
    regex(IP4_ADDRESS, "127.0.0.13")
}

pub fn ip6_address() -> Node {
    regex(IP6_ADDRESS, "::ffff:192.0.2.128")
}

pub fn hexadecimal() -> Node {
    regex(HEXADECIMAL, "3F")
}

/// Base64 text. The example is `"example"` encoded.
pub fn base64() -> Node {
    regex(BASE64, "ZXhhbXBsZQo=")
}

pub fn uuid(example: &str) -> Node {
    regex(UUID, example)
}

/// Matches strings containing every value (`And`) or any value (`Or`).
///
/// The example is the values joined with spaces.
pub fn includes<I, T>(values: I, logic: RuleLogic) -> Node
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let values: Vec<String> = values.into_iter().map(Into::into).collect();
    let example = values.join(" ");
    includes_with_example(values, logic, &example)
}

/// Like [`includes`] with an explicit example.
pub fn includes_with_example<I, T>(values: I, logic: RuleLogic, example: &str) -> Node
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let rules: Vec<MatchingRule> = values
        .into_iter()
        .map(|value| MatchingRule::Include {
            value: value.into(),
        })
        .collect();
    if rules.is_empty() {
        return Node::invalid_parameter("includes()", "at least one value is required");
    }
    with_rules(rules, Some(logic), example)
}

// Date and time matchers

/// A timestamp in the Java-style `format`.
pub fn datetime(value: &str, format: &str) -> Node {
    if let Err(invalid) = checked_format("datetime", value, format) {
        return invalid;
    }
    with_rule(
        MatchingRule::Timestamp {
            format: format.to_string(),
        },
        value,
    )
}

pub fn date(value: &str, format: &str) -> Node {
    if let Err(invalid) = checked_format("date", value, format) {
        return invalid;
    }
    with_rule(
        MatchingRule::Date {
            format: format.to_string(),
        },
        value,
    )
}

pub fn time(value: &str, format: &str) -> Node {
    if let Err(invalid) = checked_format("time", value, format) {
        return invalid;
    }
    with_rule(
        MatchingRule::Time {
            format: format.to_string(),
        },
        value,
    )
}

// Status matchers

/// A response status in a class, or one of explicit codes.
pub fn status_code(status: StatusCodeRange) -> Node {
    let example = match &status {
        StatusCodeRange::Class(class) => class.example_code(),
        StatusCodeRange::Codes(codes) => match codes.first() {
            Some(code) => *code,
            None => {
                return Node::invalid_parameter("statusCode([])", "at least one code is required")
            }
        },
    };
    with_rule(MatchingRule::StatusCode { status }, example)
}

/// Shorthand for a status class.
pub fn status_class(class: HttpStatus) -> Node {
    status_code(StatusCodeRange::Class(class))
}

// Collection matchers

/// Every element matches the example by type; at least one element.
pub fn each_like(value: impl Into<Node>) -> Node {
    each_like_with(value, Some(1), None)
}

/// Every element matches the example by type, within `min..=max` elements.
///
/// A sequence or mapping example is used as the repeated collection; any
/// other example becomes a one-element sequence.
pub fn each_like_with(value: impl Into<Node>, min: Option<usize>, max: Option<usize>) -> Node {
    let value = value.into();
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Node::invalid_parameter(
                format!("eachLike({})", value.describe()),
                format!("minimum {min} is greater than maximum {max}"),
            );
        }
    }
    let collection = match value {
        Node::Sequence(_) | Node::Mapping(_) => value,
        other => Node::Sequence(vec![other]),
    };
    Node::Repetition(Box::new(Repetition {
        collection,
        min,
        max,
    }))
}

/// Every member of a mapping matches the example's members by type.
pub fn each_key_like(value: impl Into<Node>) -> Node {
    like(value)
}

/// An array containing at least one element matching each variant.
pub fn array_contains<I, V>(variants: I) -> Node
where
    I: IntoIterator<Item = V>,
    V: Into<Node>,
{
    let variants: Vec<Node> = variants.into_iter().map(Into::into).collect();
    if variants.is_empty() {
        return Node::invalid_parameter("arrayContains()", "at least one variant is required");
    }
    Node::ArrayContains(Box::new(ArrayContains { variants }))
}

// Matcher + generator composites

/// A value injected from the provider state parameter `parameter`.
///
/// In a request path only the generator is recorded.
pub fn from_provider_state(parameter: &str, value: impl Into<Node>) -> Node {
    with_generator(
        MatchingRule::type_match(),
        GeneratorDeclaration::ProviderState {
            expression: parameter.to_string(),
        },
        value,
    )
}

/// A string of the example's type regenerated with `size` characters,
/// defaulting to the example's length.
pub fn random_string_like(value: &str, size: Option<usize>) -> Node {
    let size = size.unwrap_or_else(|| value.chars().count());
    with_generator(
        MatchingRule::type_match(),
        GeneratorDeclaration::RandomString { size },
        value,
    )
}

/// An integer of the example's type regenerated within `min..=max`.
pub fn random_integer_like(value: i64, min: i64, max: i64) -> Node {
    if min > max {
        return Node::invalid_parameter(
            format!("randomInteger({value})"),
            format!("minimum {min} is greater than maximum {max}"),
        );
    }
    with_generator(
        MatchingRule::type_match(),
        GeneratorDeclaration::RandomInt { min, max },
        value,
    )
}

/// An integer regenerated within `min..=max`, with a random example.
pub fn random_integer(min: i64, max: i64) -> Node {
    match generators::random_int(min, max) {
        Node::Generator(generated) => with_generator(
            MatchingRule::type_match(),
            generated.declaration,
            generated.value,
        ),
        invalid => invalid,
    }
}

/// A decimal of the example's type regenerated with `digits` digits.
pub fn random_decimal_like(value: impl Into<Node>, digits: u8) -> Node {
    with_generator(
        MatchingRule::type_match(),
        GeneratorDeclaration::RandomDecimal {
            digits: digits.clamp(1, MAX_DECIMAL_DIGITS),
        },
        value,
    )
}

pub fn random_boolean() -> Node {
    with_generator(
        MatchingRule::type_match(),
        GeneratorDeclaration::RandomBoolean,
        true,
    )
}

/// A UUID regenerated in `format`. The example must already be in it.
pub fn random_uuid_like(value: &str, format: UuidFormat) -> Node {
    let fits = regex::Regex::new(format.matching_regex())
        .map(|pattern| pattern.is_match(value))
        .unwrap_or(false);
    if !fits {
        return Node::invalid_parameter(
            format!("randomUUID(\"{value}\")"),
            format!("example is not a {} UUID", format.label()),
        );
    }
    with_generator(
        MatchingRule::type_match(),
        GeneratorDeclaration::Uuid {
            format: Some(format),
        },
        value,
    )
}

/// A hexadecimal string regenerated with `digits` digits, defaulting to
/// the example's length.
pub fn random_hexadecimal_like(value: &str, digits: Option<u8>) -> Node {
    let digits = match digits {
        Some(digits) => digits,
        None => match u8::try_from(value.chars().count()) {
            Ok(digits) => digits,
            Err(_) => {
                return Node::invalid_parameter(
                    format!("randomHexadecimal(\"{value}\")"),
                    "example is longer than 255 digits",
                )
            }
        },
    };
    with_generator(
        MatchingRule::type_match(),
        GeneratorDeclaration::RandomHexadecimal { digits },
        value,
    )
}

fn generated_moment(
    moment: generators::Moment,
    value: &str,
    format: &str,
    expression: Option<&str>,
) -> Node {
    let declaration = GeneratorDeclaration::moment(
        moment,
        Some(format.to_string()),
        expression.map(str::to_string),
    );
    if let Err(invalid) = checked_format(declaration.kind(), value, format) {
        return invalid;
    }
    with_generator(MatchingRule::type_match(), declaration, value)
}

pub fn generated_date(value: &str, format: &str, expression: Option<&str>) -> Node {
    generated_moment(generators::Moment::Date, value, format, expression)
}

pub fn generated_time(value: &str, format: &str, expression: Option<&str>) -> Node {
    generated_moment(generators::Moment::Time, value, format, expression)
}

pub fn generated_datetime(value: &str, format: &str, expression: Option<&str>) -> Node {
    generated_moment(generators::Moment::DateTime, value, format, expression)
}

/// A URL on the running mock server.
///
/// `regex` must match `example` and hold exactly one capture group: the
/// part of the URL kept when the server address is substituted.
pub fn generated_mock_server_url(example: &str, regex: &str) -> Node {
    with_generator(
        MatchingRule::type_match(),
        GeneratorDeclaration::MockServerUrl {
            example: example.to_string(),
            regex: regex.to_string(),
        },
        example,
    )
}

/// The example value a node carries, without compiling it.
pub fn example_of(node: &Node) -> Option<&Scalar> {
    match node {
        Node::Scalar(scalar) => Some(scalar),
        Node::Matcher(m) => example_of(&m.value),
        Node::Generator(g) => example_of(&g.value),
        Node::MatcherGenerator(c) => example_of(&c.value),
        _ => None,
    }
}
