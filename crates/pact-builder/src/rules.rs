//! Matching rule declarations as they appear in a contract document.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::generators::GeneratorDeclaration;
use crate::path::Path;

/// Path-indexed declarations produced for one sub-tree.
pub type PathMap<T> = BTreeMap<Path, T>;

/// One matching rule, serialized with its `match` tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "match", rename_all = "camelCase")]
pub enum MatchingRule {
    Equality,
    Type {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
    Integer,
    Decimal,
    Number,
    Regex {
        regex: String,
    },
    Include {
        value: String,
    },
    Null,
    Boolean,
    NotEmpty,
    Semver,
    Timestamp {
        format: String,
    },
    Date {
        format: String,
    },
    Time {
        format: String,
    },
    StatusCode {
        status: StatusCodeRange,
    },
    ArrayContains {
        variants: Vec<ArrayContainsVariant>,
    },
}

impl MatchingRule {
    /// Plain type match without cardinality.
    pub fn type_match() -> Self {
        MatchingRule::Type {
            min: None,
            max: None,
        }
    }

    /// The `match` tag this rule serializes with.
    pub fn kind(&self) -> &'static str {
        match self {
            MatchingRule::Equality => "equality",
            MatchingRule::Type { .. } => "type",
            MatchingRule::Integer => "integer",
            MatchingRule::Decimal => "decimal",
            MatchingRule::Number => "number",
            MatchingRule::Regex { .. } => "regex",
            MatchingRule::Include { .. } => "include",
            MatchingRule::Null => "null",
            MatchingRule::Boolean => "boolean",
            MatchingRule::NotEmpty => "notEmpty",
            MatchingRule::Semver => "semver",
            MatchingRule::Timestamp { .. } => "timestamp",
            MatchingRule::Date { .. } => "date",
            MatchingRule::Time { .. } => "time",
            MatchingRule::StatusCode { .. } => "statusCode",
            MatchingRule::ArrayContains { .. } => "arrayContains",
        }
    }
}

/// How multiple rules at one path combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleLogic {
    #[default]
    And,
    Or,
}

/// The rules recorded at one path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSet {
    pub matchers: Vec<MatchingRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combine: Option<RuleLogic>,
}

impl RuleSet {
    pub fn new(matchers: Vec<MatchingRule>) -> Self {
        Self {
            matchers,
            combine: None,
        }
    }

    pub fn combined(matchers: Vec<MatchingRule>, logic: RuleLogic) -> Self {
        Self {
            matchers,
            combine: Some(logic),
        }
    }
}

/// Status classes understood by the `statusCode` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HttpStatus {
    Information,
    Success,
    Redirect,
    ClientError,
    ServerError,
    NonError,
    Error,
}

impl HttpStatus {
    /// A representative code used as the example value.
    pub fn example_code(self) -> u16 {
        match self {
            HttpStatus::Information => 100,
            HttpStatus::Success | HttpStatus::NonError => 200,
            HttpStatus::Redirect => 300,
            HttpStatus::ClientError | HttpStatus::Error => 400,
            HttpStatus::ServerError => 500,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "information" => Some(HttpStatus::Information),
            "success" => Some(HttpStatus::Success),
            "redirect" => Some(HttpStatus::Redirect),
            "clientError" => Some(HttpStatus::ClientError),
            "serverError" => Some(HttpStatus::ServerError),
            "nonError" => Some(HttpStatus::NonError),
            "error" => Some(HttpStatus::Error),
            _ => None,
        }
    }
}

/// Either a status class or an explicit list of codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StatusCodeRange {
    Class(HttpStatus),
    Codes(Vec<u16>),
}

/// One compiled alternative of an `arrayContains` rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayContainsVariant {
    pub index: usize,
    pub rules: PathMap<RuleSet>,
    pub generators: PathMap<GeneratorDeclaration>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unit_rules_serialize_with_match_tag() {
        assert_eq!(
            serde_json::to_value(MatchingRule::Equality).unwrap(),
            json!({"match": "equality"})
        );
        assert_eq!(
            serde_json::to_value(MatchingRule::NotEmpty).unwrap(),
            json!({"match": "notEmpty"})
        );
    }

    #[test]
    fn test_type_rule_omits_missing_cardinality() {
        assert_eq!(
            serde_json::to_value(MatchingRule::type_match()).unwrap(),
            json!({"match": "type"})
        );
        let rule = MatchingRule::Type {
            min: Some(1),
            max: None,
        };
        assert_eq!(
            serde_json::to_value(rule).unwrap(),
            json!({"match": "type", "min": 1})
        );
    }

    #[test]
    fn test_parameterised_rules() {
        let regex = MatchingRule::Regex {
            regex: r"\d+".to_string(),
        };
        assert_eq!(
            serde_json::to_value(regex).unwrap(),
            json!({"match": "regex", "regex": "\\d+"})
        );
        let timestamp = MatchingRule::Timestamp {
            format: "yyyy-MM-dd HH:mm".to_string(),
        };
        assert_eq!(
            serde_json::to_value(timestamp).unwrap(),
            json!({"match": "timestamp", "format": "yyyy-MM-dd HH:mm"})
        );
    }

    #[test]
    fn test_status_code_rule() {
        let class = MatchingRule::StatusCode {
            status: StatusCodeRange::Class(HttpStatus::ClientError),
        };
        assert_eq!(
            serde_json::to_value(class).unwrap(),
            json!({"match": "statusCode", "status": "clientError"})
        );
        let codes = MatchingRule::StatusCode {
            status: StatusCodeRange::Codes(vec![200, 201]),
        };
        assert_eq!(
            serde_json::to_value(codes).unwrap(),
            json!({"match": "statusCode", "status": [200, 201]})
        );
    }

    #[test]
    fn test_rule_set_combine_is_optional() {
        let plain = RuleSet::new(vec![MatchingRule::Integer]);
        assert_eq!(
            serde_json::to_value(plain).unwrap(),
            json!({"matchers": [{"match": "integer"}]})
        );
        let combined = RuleSet::combined(
            vec![MatchingRule::Include {
                value: "a".to_string(),
            }],
            RuleLogic::Or,
        );
        assert_eq!(
            serde_json::to_value(combined).unwrap(),
            json!({"matchers": [{"match": "include", "value": "a"}], "combine": "OR"})
        );
    }

    #[test]
    fn test_http_status_names_round_trip_through_from_name() {
        assert_eq!(HttpStatus::from_name("serverError"), Some(HttpStatus::ServerError));
        assert_eq!(HttpStatus::from_name("teapot"), None);
        assert_eq!(HttpStatus::Redirect.example_code(), 300);
    }
}
