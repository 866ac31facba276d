//! What each matcher and generator variant contributes at its path, and the
//! checks a variant runs against its own example before contributing.

use regex::Regex;

use crate::error::{EncodingError, FailureReason};
use crate::generators::GeneratorDeclaration;
use crate::node::{Matcher, Node, Repetition};
use crate::path::Path;
use crate::rules::{MatchingRule, RuleLogic, RuleSet};

/// Rules entry recorded for a plain matcher.
///
/// Inclusion matchers carry their combine flag; everything else is bare.
pub fn matcher_rules(matcher: &Matcher) -> RuleSet {
    match matcher.combine {
        Some(logic) => RuleSet::combined(matcher.rules.clone(), logic),
        None => RuleSet::new(matcher.rules.clone()),
    }
}

/// Rules entry recorded at a repetition's own (pre-wildcard) path.
pub fn repetition_rules(repetition: &Repetition) -> RuleSet {
    RuleSet::combined(
        vec![MatchingRule::Type {
            min: repetition.min,
            max: repetition.max,
        }],
        RuleLogic::And,
    )
}

fn compile(pattern: &str, path: &Path) -> Result<Regex, EncodingError> {
    Regex::new(pattern).map_err(|err| {
        EncodingError::new(
            FailureReason::InvalidPattern {
                pattern: pattern.to_string(),
                message: err.to_string(),
            },
            pattern,
            path,
        )
    })
}

/// The example must be a scalar whose text satisfies `pattern`.
fn check_example(pattern: &Regex, value: &Node, path: &Path) -> Result<(), EncodingError> {
    let matches = match value {
        Node::Scalar(scalar) => pattern.is_match(&scalar.text()),
        _ => false,
    };
    if matches {
        Ok(())
    } else {
        Err(EncodingError::new(
            FailureReason::PatternMismatch {
                pattern: pattern.as_str().to_string(),
            },
            value.describe(),
            path,
        ))
    }
}

/// Checks a rule can describe its example.
pub fn check_rule(rule: &MatchingRule, value: &Node, path: &Path) -> Result<(), EncodingError> {
    match rule {
        MatchingRule::Regex { regex } => check_example(&compile(regex, path)?, value, path),
        _ => Ok(()),
    }
}

/// Checks a generator can reproduce its example.
pub fn check_generator(
    declaration: &GeneratorDeclaration,
    value: &Node,
    path: &Path,
) -> Result<(), EncodingError> {
    match declaration {
        GeneratorDeclaration::Regex { regex } => {
            check_example(&compile(regex, path)?, value, path)
        }
        GeneratorDeclaration::MockServerUrl { example, regex } => {
            let pattern = compile(regex, path)?;
            // Group 0 is the whole match.
            if pattern.captures_len() != 2 {
                return Err(EncodingError::new(
                    FailureReason::InvalidPattern {
                        pattern: regex.clone(),
                        message: format!(
                            "expected exactly one capture group, found {}",
                            pattern.captures_len() - 1
                        ),
                    },
                    regex.as_str(),
                    path,
                ));
            }
            check_example(&pattern, &Node::from(example.as_str()), path)
        }
        _ => Ok(()),
    }
}
