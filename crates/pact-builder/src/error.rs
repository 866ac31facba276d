//! Error types for interaction compilation and contract assembly.

use std::path::PathBuf;

use crate::path::Path;

/// Why a node could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureReason {
    /// The value is outside the closed set of encodable nodes.
    #[error("value is not JSON safe (String, Int, Double, Decimal, Bool, Array, Dictionary, Matcher or Generator)")]
    NotEncodable,

    /// A regex matcher's example does not satisfy its own pattern.
    #[error("example does not match the pattern \"{pattern}\"")]
    PatternMismatch { pattern: String },

    /// A pattern failed to compile or has the wrong shape.
    #[error("invalid pattern \"{pattern}\": {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A matcher directly wraps another matcher.
    #[error("matchers can not wrap other matchers directly")]
    NestedMatcher,

    /// Two sibling sub-trees produced the same path.
    #[error("more than one value resolved to the same path")]
    PathCollision,

    /// The structure is nested deeper than the configured guard.
    #[error("structure is nested deeper than {limit} levels")]
    DepthExceeded { limit: usize },

    /// A matcher or generator was declared with unusable parameters.
    #[error("{message}")]
    InvalidParameter { message: String },
}

/// Encoding failure for one interaction element.
///
/// Carries the offending value (or its closest string representation) and the
/// partial path reached before the failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Error preparing pact! {reason}: '{value}' at '{path}'")]
pub struct EncodingError {
    pub reason: FailureReason,
    pub value: String,
    pub path: Path,
}

impl EncodingError {
    pub fn new(reason: FailureReason, value: impl Into<String>, path: &Path) -> Self {
        Self {
            reason,
            value: value.into(),
            path: path.clone(),
        }
    }

    /// Failure for a value outside the closed node set.
    pub fn not_encodable(value: impl Into<String>, path: &Path) -> Self {
        Self::new(FailureReason::NotEncodable, value, path)
    }
}

/// Errors raised while assembling, writing or verifying a contract.
#[derive(Debug, thiserror::Error)]
pub enum PactError {
    #[error("{} interaction(s) could not be encoded: {}", .0.len(), describe_failures(.0))]
    Encoding(Vec<InteractionFailure>),

    #[error("Failed to serialize pact contract: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write pact contract to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Verification failed with {} mismatch(es)", .0.mismatches.len())]
    Verification(crate::services::VerificationFailure),

    #[error("Pact broker request failed: {0}")]
    Broker(String),
}

/// An encoding failure attributed to the interaction that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionFailure {
    pub description: String,
    pub error: EncodingError,
}

fn describe_failures(failures: &[InteractionFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("\"{}\" ({})", f.description, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}
