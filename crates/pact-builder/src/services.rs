//! Interfaces to the collaborators around the compiler: the mock server that
//! verifies a contract, the writer and broker that persist and share it, and
//! the sink test failures are reported to.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PactConfig;
use crate::error::PactError;
use crate::pact::PactDocument;

/// Protocol the mock server listens on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferProtocol {
    #[default]
    Http,
    Https,
}

impl TransferProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferProtocol::Http => "http",
            TransferProtocol::Https => "https",
        }
    }
}

/// One difference between an expected and an actual request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(path) = &self.path {
            write!(f, " at {path}")?;
        }
        match (&self.expected, &self.actual) {
            (Some(expected), Some(actual)) => {
                write!(f, ": expected {expected}, got {actual}")
            }
            (Some(expected), None) => write!(f, ": expected {expected}"),
            (None, Some(actual)) => write!(f, ": got {actual}"),
            (None, None) => Ok(()),
        }
    }
}

/// Structured description of a failed verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationFailure {
    pub mismatches: Vec<Mismatch>,
}

impl From<VerificationFailure> for PactError {
    fn from(failure: VerificationFailure) -> Self {
        PactError::Verification(failure)
    }
}

/// A mock server that serves a contract and reports what did not match.
pub trait MockServer {
    fn verify(
        &self,
        pact: &PactDocument,
        protocol: TransferProtocol,
    ) -> Result<(), VerificationFailure>;
}

/// Persists a finished contract.
pub trait ContractWriter {
    /// Returns where the contract was written.
    fn write(&self, pact: &PactDocument) -> Result<PathBuf, PactError>;
}

/// A pact broker client.
pub trait ContractBroker {
    /// Publish a contract under a consumer application version.
    fn publish(&self, pact: &PactDocument, consumer_version: &str) -> Result<(), PactError>;

    /// The latest contract between two pacticipants, as raw JSON.
    fn fetch(&self, consumer: &str, provider: &str) -> Result<Option<serde_json::Value>, PactError>;
}

/// The assertion sink of the surrounding test harness.
pub trait ErrorReporter {
    fn report(&self, message: &str, location: Option<&str>);
}

/// Writes `<consumer>-<provider>.json` into a directory.
#[derive(Debug, Clone)]
pub struct JsonFileWriter {
    dir: PathBuf,
}

impl JsonFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &PactConfig) -> Self {
        Self::new(config.output_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ContractWriter for JsonFileWriter {
    fn write(&self, pact: &PactDocument) -> Result<PathBuf, PactError> {
        fs::create_dir_all(&self.dir).map_err(|source| PactError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(pact.file_name());
        let contents = serde_json::to_string_pretty(pact)?;
        fs::write(&path, contents).map_err(|source| PactError::Io {
            path: path.clone(),
            source,
        })?;

        info!(
            path = %path.display(),
            interactions = pact.interactions.len(),
            "wrote pact contract"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{HttpMethod, Interaction, Request, Response};
    use crate::pact::Pact;

    fn document() -> PactDocument {
        Pact::new("ios-app", "user-service")
            .with_interaction(
                Interaction::new("a request for users")
                    .with_request(Request::new(HttpMethod::Get, "/users"))
                    .will_respond_with(Response::new(200)),
            )
            .document()
            .unwrap()
    }

    #[test]
    fn test_json_file_writer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonFileWriter::new(dir.path().join("nested/pacts"));
        let path = writer.write(&document()).unwrap();

        assert_eq!(path.file_name().unwrap(), "ios-app-user-service.json");
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["consumer"]["name"], "ios-app");
        assert_eq!(written["interactions"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_json_file_writer_reports_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();
        let err = JsonFileWriter::new(&blocker).write(&document()).unwrap_err();
        assert!(matches!(err, PactError::Io { .. }));
    }

    #[derive(Default)]
    struct InMemoryBroker {
        published: std::cell::RefCell<Vec<(String, serde_json::Value)>>,
    }

    impl ContractBroker for InMemoryBroker {
        fn publish(&self, pact: &PactDocument, consumer_version: &str) -> Result<(), PactError> {
            if consumer_version.is_empty() {
                return Err(PactError::Broker("consumer version is required".into()));
            }
            let value = serde_json::to_value(pact)?;
            self.published
                .borrow_mut()
                .push((consumer_version.to_string(), value));
            Ok(())
        }

        fn fetch(
            &self,
            consumer: &str,
            provider: &str,
        ) -> Result<Option<serde_json::Value>, PactError> {
            Ok(self
                .published
                .borrow()
                .iter()
                .rev()
                .map(|(_, value)| value)
                .find(|value| {
                    value["consumer"]["name"] == consumer && value["provider"]["name"] == provider
                })
                .cloned())
        }
    }

    #[test]
    fn test_broker_round_trip_through_trait_object() {
        let broker = InMemoryBroker::default();
        let client: &dyn ContractBroker = &broker;

        client.publish(&document(), "1.0.0").unwrap();
        let fetched = client.fetch("ios-app", "user-service").unwrap().unwrap();
        assert_eq!(fetched["metadata"]["pactSpecification"]["version"], "3.0.0");
        assert!(client.fetch("ios-app", "billing").unwrap().is_none());

        let err = client.publish(&document(), "").unwrap_err();
        assert!(err.to_string().contains("consumer version"));
    }

    #[test]
    fn test_mismatch_display() {
        let mismatch = Mismatch {
            kind: "BodyMismatch".into(),
            path: Some("$.id".into()),
            expected: Some("1".into()),
            actual: Some("\"1\"".into()),
        };
        assert_eq!(mismatch.to_string(), "BodyMismatch at $.id: expected 1, got \"1\"");
    }

    #[test]
    fn test_mismatch_deserializes_from_mock_server_json() {
        let mismatch: Mismatch =
            serde_json::from_str(r#"{"type": "MissingRequest", "path": "/users"}"#).unwrap();
        assert_eq!(mismatch.kind, "MissingRequest");
        assert_eq!(mismatch.expected, None);
    }
}
