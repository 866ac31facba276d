//! Normalizes the Pact integration JSON format into [`Node`] trees.
//!
//! Objects carrying `pact:matcher:type` and/or `pact:generator:type` become
//! matcher, generator or composite nodes. Everything else maps onto plain
//! data. Unknown marker types become [`Node::Invalid`] and surface as
//! encoding failures once the tree is compiled.

use serde_json::{Map, Value};

use crate::generators::{
    self, GeneratorDeclaration, UuidFormat, MAX_DECIMAL_DIGITS, MAX_STRING_SIZE,
};
use crate::matchers;
use crate::node::{self, Generator, Matcher, MatcherGenerator, Node};
use crate::rules::{HttpStatus, MatchingRule, StatusCodeRange};

pub const MATCHER_TYPE: &str = "pact:matcher:type";
pub const GENERATOR_TYPE: &str = "pact:generator:type";

const DEFAULT_RANDOM_MIN: i64 = 0;
const DEFAULT_RANDOM_MAX: i64 = 10;
const DEFAULT_RANDOM_LENGTH: u64 = 10;

type Fields = Map<String, Value>;

/// Convert an integration JSON value.
pub fn from_integration_json(value: &Value) -> Node {
    match value {
        Value::Null => Node::null(),
        Value::Bool(b) => Node::from(*b),
        Value::Number(n) => node::number_node(n),
        Value::String(s) => Node::from(s.as_str()),
        Value::Array(items) => Node::Sequence(items.iter().map(from_integration_json).collect()),
        Value::Object(fields) if is_marked(fields) => marked(fields),
        Value::Object(fields) => Node::Mapping(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), from_integration_json(value)))
                .collect(),
        ),
    }
}

fn is_marked(fields: &Fields) -> bool {
    fields.contains_key(MATCHER_TYPE) || fields.contains_key(GENERATOR_TYPE)
}

fn marked(fields: &Fields) -> Node {
    let value = fields.get("value").map(from_integration_json);
    let matcher = fields.get(MATCHER_TYPE).map(type_name);
    let generator = fields.get(GENERATOR_TYPE).map(type_name);

    match (matcher, generator) {
        (Some(Err(invalid)), _) | (_, Some(Err(invalid))) => invalid,
        (Some(Ok(kind)), None) => matcher_node(kind, fields, value),
        (None, Some(Ok(kind))) => generator_node(kind, fields, value),
        (Some(Ok(matcher)), Some(Ok(generator))) => composite_node(matcher, generator, fields, value),
        (None, None) => Node::invalid(Value::Object(fields.clone()).to_string()),
    }
}

fn type_name(marker: &Value) -> Result<&str, Node> {
    marker
        .as_str()
        .ok_or_else(|| Node::invalid(marker.to_string()))
}

fn required_value(kind: &str, value: Option<Node>) -> Result<Node, Node> {
    value.ok_or_else(|| Node::invalid_parameter(kind, "a 'value' is required"))
}

fn required_str<'a>(kind: &str, fields: &'a Fields, key: &str) -> Result<&'a str, Node> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Node::invalid_parameter(kind, format!("'{key}' must be a string")))
}

fn optional_str<'a>(kind: &str, fields: &'a Fields, key: &str) -> Result<Option<&'a str>, Node> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(Node::invalid_parameter(kind, format!("'{key}' must be a string"))),
    }
}

fn optional_u64(kind: &str, fields: &Fields, key: &str) -> Result<Option<u64>, Node> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            Node::invalid_parameter(kind, format!("'{key}' must be a non-negative integer"))
        }),
    }
}

fn optional_i64(kind: &str, fields: &Fields, key: &str) -> Result<Option<i64>, Node> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| Node::invalid_parameter(kind, format!("'{key}' must be an integer"))),
    }
}

fn bound(kind: &str, fields: &Fields, key: &str) -> Result<Option<usize>, Node> {
    Ok(optional_u64(kind, fields, key)?.map(|n| usize::try_from(n).unwrap_or(usize::MAX)))
}

fn checked_format(kind: &str, format: &str) -> Result<(), Node> {
    generators::to_strftime(format)
        .map(|_| ())
        .map_err(|problem| Node::invalid_parameter(format!("{kind}(\"{format}\")"), problem))
}

// Matchers

fn matcher_node(kind: &str, fields: &Fields, value: Option<Node>) -> Node {
    let built = match kind {
        "eachLike" => repetition(kind, fields, value),
        "type" if fields.contains_key("min") || fields.contains_key("max") => {
            repetition(kind, fields, value)
        }
        "arrayContains" => array_contains(kind, fields),
        "statusCode" => status_code(kind, fields),
        _ => matcher_rule(kind, fields).and_then(|rule| {
            Ok(Node::Matcher(Box::new(Matcher {
                rules: vec![rule],
                combine: None,
                value: required_value(kind, value)?,
            })))
        }),
    };
    built.unwrap_or_else(|invalid| invalid)
}

fn repetition(kind: &str, fields: &Fields, value: Option<Node>) -> Result<Node, Node> {
    let min = bound(kind, fields, "min")?;
    let max = bound(kind, fields, "max")?;
    Ok(matchers::each_like_with(required_value(kind, value)?, min, max))
}

fn array_contains(kind: &str, fields: &Fields) -> Result<Node, Node> {
    let variants = fields
        .get("variants")
        .and_then(Value::as_array)
        .ok_or_else(|| Node::invalid_parameter(kind, "'variants' must be an array"))?;
    Ok(matchers::array_contains(variants.iter().map(from_integration_json)))
}

fn status_code(kind: &str, fields: &Fields) -> Result<Node, Node> {
    let range = match fields.get("status") {
        Some(Value::String(name)) => HttpStatus::from_name(name)
            .map(StatusCodeRange::Class)
            .ok_or_else(|| Node::invalid_parameter(kind, format!("unknown status class '{name}'")))?,
        Some(Value::Array(codes)) => StatusCodeRange::Codes(
            codes
                .iter()
                .map(|code| code.as_u64().and_then(|c| u16::try_from(c).ok()))
                .collect::<Option<Vec<u16>>>()
                .ok_or_else(|| Node::invalid_parameter(kind, "status codes must be integers"))?,
        ),
        _ => {
            return Err(Node::invalid_parameter(
                kind,
                "'status' must be a class name or a list of codes",
            ))
        }
    };
    Ok(matchers::status_code(range))
}

/// The single rule a matcher marker declares.
fn matcher_rule(kind: &str, fields: &Fields) -> Result<MatchingRule, Node> {
    let rule = match kind {
        "type" => MatchingRule::Type {
            min: bound(kind, fields, "min")?,
            max: bound(kind, fields, "max")?,
        },
        "equality" => MatchingRule::Equality,
        "integer" => MatchingRule::Integer,
        "decimal" => MatchingRule::Decimal,
        "number" => MatchingRule::Number,
        "null" => MatchingRule::Null,
        "boolean" => MatchingRule::Boolean,
        "notEmpty" => MatchingRule::NotEmpty,
        "semver" => MatchingRule::Semver,
        "regex" => MatchingRule::Regex {
            regex: required_str(kind, fields, "regex")?.to_string(),
        },
        "include" => MatchingRule::Include {
            value: required_str(kind, fields, "value")?.to_string(),
        },
        "timestamp" | "datetime" | "date" | "time" => {
            let format = required_str(kind, fields, "format")?;
            checked_format(kind, format)?;
            let format = format.to_string();
            match kind {
                "date" => MatchingRule::Date { format },
                "time" => MatchingRule::Time { format },
                _ => MatchingRule::Timestamp { format },
            }
        }
        "eachLike" | "arrayContains" | "statusCode" => {
            return Err(Node::invalid_parameter(
                kind,
                "this matcher can not be combined with a generator",
            ))
        }
        other => return Err(Node::invalid(format!("unknown matcher type '{other}'"))),
    };
    Ok(rule)
}

// Generators

fn generator_node(kind: &str, fields: &Fields, value: Option<Node>) -> Node {
    let declaration = match declaration(kind, fields) {
        Ok(declaration) => declaration,
        Err(invalid) => return invalid,
    };
    match value {
        Some(value) => Node::Generator(Box::new(Generator { declaration, value })),
        None => generated_example(declaration),
    }
}

fn composite_node(matcher: &str, generator: &str, fields: &Fields, value: Option<Node>) -> Node {
    let built = matcher_rule(matcher, fields).and_then(|rule| {
        let generator = declaration(generator, fields)?;
        let value = match value {
            Some(value) => value,
            None => match generated_example(generator.clone()) {
                Node::Generator(generated) => generated.value,
                invalid => return Err(invalid),
            },
        };
        Ok(Node::MatcherGenerator(Box::new(MatcherGenerator {
            rule,
            generator,
            value,
        })))
    });
    built.unwrap_or_else(|invalid| invalid)
}

/// The generator a marker declares, with the integration format's defaults.
fn declaration(kind: &str, fields: &Fields) -> Result<GeneratorDeclaration, Node> {
    let declaration = match kind {
        "RandomBoolean" => GeneratorDeclaration::RandomBoolean,
        "RandomInt" => GeneratorDeclaration::RandomInt {
            min: optional_i64(kind, fields, "min")?.unwrap_or(DEFAULT_RANDOM_MIN),
            max: optional_i64(kind, fields, "max")?.unwrap_or(DEFAULT_RANDOM_MAX),
        },
        "RandomDecimal" => {
            let digits = optional_u64(kind, fields, "digits")?.unwrap_or(DEFAULT_RANDOM_LENGTH);
            if digits == 0 {
                return Err(Node::invalid_parameter(kind, "a decimal needs at least one digit"));
            }
            GeneratorDeclaration::RandomDecimal {
                digits: digits.min(u64::from(MAX_DECIMAL_DIGITS)) as u8,
            }
        }
        "RandomHexadecimal" => GeneratorDeclaration::RandomHexadecimal {
            digits: optional_u64(kind, fields, "digits")?
                .unwrap_or(DEFAULT_RANDOM_LENGTH)
                .min(u64::from(u8::MAX)) as u8,
        },
        "RandomString" => {
            let size = optional_u64(kind, fields, "size")?.unwrap_or(DEFAULT_RANDOM_LENGTH);
            match usize::try_from(size) {
                Ok(size) if size <= MAX_STRING_SIZE => GeneratorDeclaration::RandomString { size },
                _ => {
                    return Err(Node::invalid_parameter(
                        kind,
                        format!("size {size} is larger than {MAX_STRING_SIZE}"),
                    ))
                }
            }
        }
        "Regex" => GeneratorDeclaration::Regex {
            regex: required_str(kind, fields, "regex")?.to_string(),
        },
        "Date" | "Time" | "DateTime" => {
            let format = optional_str(kind, fields, "format")?;
            if let Some(format) = format {
                checked_format(kind, format)?;
            }
            let moment = match kind {
                "Date" => generators::Moment::Date,
                "Time" => generators::Moment::Time,
                _ => generators::Moment::DateTime,
            };
            GeneratorDeclaration::moment(
                moment,
                format.map(str::to_string),
                optional_str(kind, fields, "expression")?.map(str::to_string),
            )
        }
        "Uuid" => GeneratorDeclaration::Uuid {
            format: match optional_str(kind, fields, "format")? {
                None => None,
                Some(name) => Some(UuidFormat::from_name(name).ok_or_else(|| {
                    Node::invalid_parameter(kind, format!("unknown UUID format '{name}'"))
                })?),
            },
        },
        "ProviderState" => GeneratorDeclaration::ProviderState {
            expression: required_str(kind, fields, "expression")?.to_string(),
        },
        "MockServerURL" => GeneratorDeclaration::MockServerUrl {
            example: required_str(kind, fields, "example")?.to_string(),
            regex: required_str(kind, fields, "regex")?.to_string(),
        },
        other => return Err(Node::invalid(format!("unknown generator type '{other}'"))),
    };
    Ok(declaration)
}

/// A generator node whose example is computed from its declaration.
fn generated_example(declaration: GeneratorDeclaration) -> Node {
    let computed = match &declaration {
        GeneratorDeclaration::RandomBoolean => generators::random_bool(),
        GeneratorDeclaration::RandomInt { min, max } => generators::random_int(*min, *max),
        GeneratorDeclaration::RandomDecimal { digits } => generators::random_decimal(*digits),
        GeneratorDeclaration::RandomHexadecimal { digits } => {
            generators::random_hexadecimal(*digits)
        }
        GeneratorDeclaration::RandomString { size } => generators::random_string(*size),
        GeneratorDeclaration::Date { format, .. } => generators::date(format.as_deref()),
        GeneratorDeclaration::Time { format, .. } => generators::time(format.as_deref()),
        GeneratorDeclaration::DateTime { format, .. } => generators::datetime(format.as_deref()),
        GeneratorDeclaration::Uuid { format } => generators::uuid(*format),
        GeneratorDeclaration::MockServerUrl { example, .. } => Node::from(example.as_str()),
        GeneratorDeclaration::Regex { .. } | GeneratorDeclaration::ProviderState { .. } => {
            return Node::invalid_parameter(declaration.kind(), "a 'value' is required")
        }
    };
    match computed {
        Node::Generator(generated) => Node::Generator(Box::new(Generator {
            declaration,
            value: generated.value,
        })),
        Node::Scalar(example) => Node::Generator(Box::new(Generator {
            declaration,
            value: Node::Scalar(example),
        })),
        invalid => invalid,
    }
}
