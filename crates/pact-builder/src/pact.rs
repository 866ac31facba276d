//! The interaction registry and the contract document it produces.

use serde::Serialize;

use crate::error::{InteractionFailure, PactError};
use crate::interaction::Interaction;
use crate::services::{ErrorReporter, MockServer, TransferProtocol};

/// Pact specification version of the produced documents.
pub const PACT_SPECIFICATION_VERSION: &str = "3.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pacticipant {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionEntry {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub pact_specification: VersionEntry,
    pub pact_builder: VersionEntry,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            pact_specification: VersionEntry {
                version: PACT_SPECIFICATION_VERSION.to_string(),
            },
            pact_builder: VersionEntry {
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// A finished contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PactDocument {
    pub consumer: Pacticipant,
    pub provider: Pacticipant,
    pub interactions: Vec<Interaction>,
    pub metadata: Metadata,
}

impl PactDocument {
    /// `<consumer>-<provider>.json`
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.consumer.name, self.provider.name)
    }
}

/// Interactions declared between one consumer and one provider.
#[derive(Debug, Clone, Default)]
pub struct Pact {
    consumer: String,
    provider: String,
    interactions: Vec<Interaction>,
}

impl Pact {
    pub fn new(consumer: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            consumer: consumer.into(),
            provider: provider.into(),
            interactions: Vec::new(),
        }
    }

    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.push(interaction);
        self
    }

    pub fn push(&mut self, interaction: Interaction) {
        self.interactions.push(interaction);
    }

    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Every encoding failure, attributed to its interaction, in declaration
    /// order.
    pub fn encoding_failures(&self) -> Vec<InteractionFailure> {
        self.interactions
            .iter()
            .flat_map(|interaction| {
                interaction
                    .encoding_errors()
                    .iter()
                    .map(|error| InteractionFailure {
                        description: interaction.description().to_string(),
                        error: error.clone(),
                    })
            })
            .collect()
    }

    /// Assemble the contract, or list every interaction that failed.
    pub fn document(&self) -> Result<PactDocument, PactError> {
        let failures = self.encoding_failures();
        if !failures.is_empty() {
            return Err(PactError::Encoding(failures));
        }
        Ok(PactDocument {
            consumer: Pacticipant {
                name: self.consumer.clone(),
            },
            provider: Pacticipant {
                name: self.provider.clone(),
            },
            interactions: self.interactions.clone(),
            metadata: Metadata::default(),
        })
    }

    /// Push every encoding failure to `reporter`. Returns how many were
    /// reported.
    pub fn report_failures(&self, reporter: &dyn ErrorReporter) -> usize {
        let failures = self.encoding_failures();
        for failure in &failures {
            let message = format!("{}: {}", failure.description, failure.error);
            reporter.report(&message, Some(failure.error.path.as_str()));
        }
        failures.len()
    }

    /// Assemble the contract and hand it to `server`.
    pub fn verify(
        &self,
        server: &dyn MockServer,
        protocol: TransferProtocol,
    ) -> Result<PactDocument, PactError> {
        let document = self.document()?;
        server.verify(&document, protocol)?;
        Ok(document)
    }
}
