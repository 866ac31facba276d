//! Value generators.
//!
//! A generator wraps a freshly computed example value and declares how a
//! consumer of the contract re-derives a live value at verification time.
//! The declaration is deterministic; the example is recomputed on every call.

mod date_format;
mod example;

pub use date_format::{render as render_date, to_strftime};
pub use example::Moment;

use serde::Serialize;
use uuid::Uuid;

use crate::node::{Generator, Node};

/// Largest digit count a `RandomDecimal` generator accepts.
pub const MAX_DECIMAL_DIGITS: u8 = 9;

/// Largest size a `RandomString` generator accepts.
pub const MAX_STRING_SIZE: usize = 4096;

/// Textual layout of a generated UUID.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum UuidFormat {
    /// `936da01f9abd4d9d80c702af85c822a8`
    #[serde(rename = "simple")]
    Simple,
    /// `936da01f-9abd-4d9d-80c7-02af85c822a8`
    #[default]
    #[serde(rename = "lower-case-hyphenated")]
    LowerCaseHyphenated,
    /// `936DA01F-9ABD-4D9D-80C7-02AF85C822A8`
    #[serde(rename = "upper-case-hyphenated")]
    UpperCaseHyphenated,
    /// `urn:uuid:936da01f-9abd-4d9d-80c7-02af85c822a8`
    #[serde(rename = "URN")]
    Urn,
}

impl UuidFormat {
    pub const ALL: [UuidFormat; 4] = [
        UuidFormat::Simple,
        UuidFormat::LowerCaseHyphenated,
        UuidFormat::UpperCaseHyphenated,
        UuidFormat::Urn,
    ];

    /// Parse the name a format serializes with.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "simple" => Some(UuidFormat::Simple),
            "lower-case-hyphenated" => Some(UuidFormat::LowerCaseHyphenated),
            "upper-case-hyphenated" => Some(UuidFormat::UpperCaseHyphenated),
            "URN" => Some(UuidFormat::Urn),
            _ => None,
        }
    }

    /// A pattern every UUID rendered in this format satisfies.
    pub fn matching_regex(self) -> &'static str {
        match self {
            UuidFormat::Simple => r"^[0-9a-fA-F]{32}$",
            UuidFormat::LowerCaseHyphenated => {
                r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$"
            }
            UuidFormat::UpperCaseHyphenated => {
                r"^[0-9A-F]{8}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{4}-[0-9A-F]{12}$"
            }
            UuidFormat::Urn => {
                r"^urn:uuid:[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$"
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UuidFormat::Simple => "simple",
            UuidFormat::LowerCaseHyphenated => "lower-case hyphenated",
            UuidFormat::UpperCaseHyphenated => "upper-case hyphenated",
            UuidFormat::Urn => "URN",
        }
    }

    pub fn render(self, uuid: &Uuid) -> String {
        match self {
            UuidFormat::Simple => uuid.simple().to_string(),
            UuidFormat::LowerCaseHyphenated => uuid.hyphenated().to_string(),
            UuidFormat::UpperCaseHyphenated => uuid.hyphenated().to_string().to_uppercase(),
            UuidFormat::Urn => uuid.urn().to_string(),
        }
    }
}

/// How a live value is re-derived, serialized with its `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum GeneratorDeclaration {
    RandomBoolean,
    RandomInt {
        min: i64,
        max: i64,
    },
    RandomDecimal {
        digits: u8,
    },
    RandomHexadecimal {
        digits: u8,
    },
    RandomString {
        size: usize,
    },
    /// A random string matching a pattern.
    Regex {
        regex: String,
    },
    Date {
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        expression: Option<String>,
    },
    Time {
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        expression: Option<String>,
    },
    DateTime {
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        expression: Option<String>,
    },
    Uuid {
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<UuidFormat>,
    },
    /// Value injected from a provider state parameter.
    ProviderState {
        expression: String,
    },
    /// A URL pointing at the running mock server. The regex must contain
    /// exactly one capture group: the part kept from the example.
    #[serde(rename = "MockServerURL")]
    MockServerUrl {
        example: String,
        regex: String,
    },
}

impl GeneratorDeclaration {
    /// The `type` tag this declaration serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratorDeclaration::RandomBoolean => "RandomBoolean",
            GeneratorDeclaration::RandomInt { .. } => "RandomInt",
            GeneratorDeclaration::RandomDecimal { .. } => "RandomDecimal",
            GeneratorDeclaration::RandomHexadecimal { .. } => "RandomHexadecimal",
            GeneratorDeclaration::RandomString { .. } => "RandomString",
            GeneratorDeclaration::Regex { .. } => "Regex",
            GeneratorDeclaration::Date { .. } => "Date",
            GeneratorDeclaration::Time { .. } => "Time",
            GeneratorDeclaration::DateTime { .. } => "DateTime",
            GeneratorDeclaration::Uuid { .. } => "Uuid",
            GeneratorDeclaration::ProviderState { .. } => "ProviderState",
            GeneratorDeclaration::MockServerUrl { .. } => "MockServerURL",
        }
    }

    /// Declaration for a date/time generator of the given moment.
    pub fn moment(moment: Moment, format: Option<String>, expression: Option<String>) -> Self {
        match moment {
            Moment::Date => GeneratorDeclaration::Date { format, expression },
            Moment::Time => GeneratorDeclaration::Time { format, expression },
            Moment::DateTime => GeneratorDeclaration::DateTime { format, expression },
        }
    }
}

fn generated(declaration: GeneratorDeclaration, value: impl Into<Node>) -> Node {
    Node::Generator(Box::new(Generator {
        declaration,
        value: value.into(),
    }))
}

/// A random boolean.
pub fn random_bool() -> Node {
    generated(GeneratorDeclaration::RandomBoolean, example::random_bool())
}

/// A random integer within `min..=max`.
pub fn random_int(min: i64, max: i64) -> Node {
    if min > max {
        return Node::invalid_parameter(
            format!("RandomInt({min}, {max})"),
            format!("minimum {min} is greater than maximum {max}"),
        );
    }
    generated(
        GeneratorDeclaration::RandomInt { min, max },
        example::random_int(min, max),
    )
}

/// A random decimal with `digits` digits. Counts above nine are capped.
pub fn random_decimal(digits: u8) -> Node {
    if digits == 0 {
        return Node::invalid_parameter("RandomDecimal(0)", "a decimal needs at least one digit");
    }
    let digits = digits.min(MAX_DECIMAL_DIGITS);
    generated(
        GeneratorDeclaration::RandomDecimal { digits },
        example::random_decimal(digits),
    )
}

/// A random upper-case hexadecimal string.
pub fn random_hexadecimal(digits: u8) -> Node {
    generated(
        GeneratorDeclaration::RandomHexadecimal { digits },
        example::random_hexadecimal(digits),
    )
}

/// A random alphanumeric string of `size` characters, at most
/// [`MAX_STRING_SIZE`].
pub fn random_string(size: usize) -> Node {
    if size > MAX_STRING_SIZE {
        return Node::invalid_parameter(
            format!("RandomString({size})"),
            format!("size {size} is larger than {MAX_STRING_SIZE}"),
        );
    }
    generated(
        GeneratorDeclaration::RandomString { size },
        example::random_string(size),
    )
}

/// A random string matching `regex`.
///
/// The example is supplied by the caller and checked against the pattern
/// when the node is compiled.
pub fn random_string_matching(regex: impl Into<String>, example: impl Into<String>) -> Node {
    generated(
        GeneratorDeclaration::Regex {
            regex: regex.into(),
        },
        example.into(),
    )
}

fn moment(moment: Moment, format: Option<&str>, expression: Option<&str>) -> Node {
    let declaration = GeneratorDeclaration::moment(
        moment,
        format.map(str::to_string),
        expression.map(str::to_string),
    );
    match example::now(moment, format) {
        Ok(value) => generated(declaration, value),
        Err(problem) => Node::invalid_parameter(
            format!("{}({})", declaration.kind(), format.unwrap_or_default()),
            problem,
        ),
    }
}

/// The current date, in `format` or ISO `yyyy-MM-dd`.
pub fn date(format: Option<&str>) -> Node {
    moment(Moment::Date, format, None)
}

/// The current time, in `format` or ISO `HH:mm:ssZ`.
pub fn time(format: Option<&str>) -> Node {
    moment(Moment::Time, format, None)
}

/// The current date and time, in `format` or RFC 3339.
pub fn datetime(format: Option<&str>) -> Node {
    moment(Moment::DateTime, format, None)
}

/// A date/time derived from an expression such as `today + 1 day`.
///
/// The example is the current moment; the expression is evaluated by the
/// contract's consumer.
pub fn datetime_expression(expression: &str, format: &str) -> Node {
    moment(Moment::DateTime, Some(format), Some(expression))
}

/// A random UUID. Without a format the example is lower-case hyphenated.
pub fn uuid(format: Option<UuidFormat>) -> Node {
    generated(
        GeneratorDeclaration::Uuid { format },
        example::uuid(format.unwrap_or_default()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Scalar;
    use serde_json::json;

    fn declaration(node: &Node) -> &GeneratorDeclaration {
        match node {
            Node::Generator(g) => &g.declaration,
            other => panic!("expected generator, got {other:?}"),
        }
    }

    #[test]
    fn test_random_string_rejects_oversized_requests() {
        assert!(random_string(MAX_STRING_SIZE + 1).is_invalid());
        assert_eq!(
            declaration(&random_string(16)),
            &GeneratorDeclaration::RandomString { size: 16 }
        );
    }

    #[test]
    fn test_declarations_serialize_with_type_tag() {
        assert_eq!(
            serde_json::to_value(GeneratorDeclaration::RandomInt { min: 1, max: 9 }).unwrap(),
            json!({"type": "RandomInt", "min": 1, "max": 9})
        );
        assert_eq!(
            serde_json::to_value(GeneratorDeclaration::Uuid {
                format: Some(UuidFormat::Urn)
            })
            .unwrap(),
            json!({"type": "Uuid", "format": "URN"})
        );
        assert_eq!(
            serde_json::to_value(GeneratorDeclaration::MockServerUrl {
                example: "http://localhost:1234/users".into(),
                regex: ".*(/users)$".into(),
            })
            .unwrap(),
            json!({"type": "MockServerURL", "example": "http://localhost:1234/users", "regex": ".*(/users)$"})
        );
    }

    #[test]
    fn test_date_generator_renders_given_format() {
        let node = date(Some("yyyy-MM-dd"));
        assert_eq!(
            declaration(&node),
            &GeneratorDeclaration::Date {
                format: Some("yyyy-MM-dd".into()),
                expression: None
            }
        );
        match &node {
            Node::Generator(g) => match &g.value {
                Node::Scalar(Scalar::String(s)) => assert_eq!(s.len(), 10),
                other => panic!("unexpected example {other:?}"),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_bad_date_format_is_an_invalid_parameter() {
        match datetime(Some("yyyy-QQ")) {
            Node::Invalid(invalid) => assert!(invalid.problem.unwrap().contains("'Q'")),
            other => panic!("expected invalid, got {other:?}"),
        }
    }

    #[test]
    fn test_expression_is_declared() {
        let node = datetime_expression("today +1 day", "yyyy-MM-dd");
        assert_eq!(
            serde_json::to_value(declaration(&node)).unwrap(),
            json!({"type": "DateTime", "format": "yyyy-MM-dd", "expression": "today +1 day"})
        );
    }

    #[test]
    fn test_random_decimal_caps_digits() {
        assert_eq!(
            declaration(&random_decimal(15)),
            &GeneratorDeclaration::RandomDecimal { digits: 9 }
        );
        assert!(random_decimal(0).is_invalid());
    }

    #[test]
    fn test_random_int_rejects_inverted_range() {
        assert!(random_int(10, 1).is_invalid());
        assert_eq!(
            declaration(&random_int(1, 10)),
            &GeneratorDeclaration::RandomInt { min: 1, max: 10 }
        );
    }

    #[test]
    fn test_uuid_format_names() {
        for format in UuidFormat::ALL {
            let name = serde_json::to_value(format).unwrap();
            assert_eq!(UuidFormat::from_name(name.as_str().unwrap()), Some(format));
        }
    }
}
