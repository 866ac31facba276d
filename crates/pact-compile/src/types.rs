//! Core types for the compiler front end.

use pact_builder::{PactConfig, DEFAULT_MAX_DEPTH};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Severity level of a compile issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The contract can not be produced.
    Error,
    /// The contract is produced but probably not what was intended.
    Warning,
    /// Informational message.
    Info,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// A single issue found while compiling a contract file.
#[derive(Debug, Clone, Serialize)]
pub struct CompileIssue {
    pub severity: Severity,
    /// Issue code (e.g., "E010", "W001").
    pub code: String,
    pub message: String,
    #[serde(serialize_with = "serialize_path")]
    pub file: PathBuf,
    /// Location within the file (e.g., "interactions[0].request.body").
    pub location: Option<String>,
    pub suggestion: Option<String>,
}

fn serialize_path<S>(path: &Path, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&path.to_string_lossy())
}

impl CompileIssue {
    fn new(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
        file: PathBuf,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            file,
            location: None,
            suggestion: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>, file: PathBuf) -> Self {
        Self::new(Severity::Error, code, message, file)
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>, file: PathBuf) -> Self {
        Self::new(Severity::Warning, code, message, file)
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>, file: PathBuf) -> Self {
        Self::new(Severity::Info, code, message, file)
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Result of compiling one or more files.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileReport {
    pub issues: Vec<CompileIssue>,
    pub files_checked: usize,
    pub interactions_compiled: usize,
    /// Contracts written to disk.
    pub contracts: Vec<PathBuf>,
    pub errors: usize,
    pub warnings: usize,
}

impl CompileReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, issue: CompileIssue) {
        match issue.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info => {}
        }
        self.issues.push(issue);
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings > 0
    }

    pub fn is_valid(&self) -> bool {
        self.errors == 0
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: CompileReport) {
        self.issues.extend(other.issues);
        self.files_checked += other.files_checked;
        self.interactions_compiled += other.interactions_compiled;
        self.contracts.extend(other.contracts);
        self.errors += other.errors;
        self.warnings += other.warnings;
    }
}

/// Options for compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Nesting limit passed to the interaction compiler.
    pub max_depth: usize,
    /// Where finished contracts are written. Nothing is written when unset.
    pub out_dir: Option<PathBuf>,
    /// Compile and report without writing.
    pub dry_run: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            out_dir: None,
            dry_run: false,
        }
    }
}

impl CompileOptions {
    pub fn from_config(config: &PactConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            out_dir: Some(config.output_dir.clone()),
            dry_run: false,
        }
    }

    /// Whether a clean contract should be written.
    pub fn writes(&self) -> bool {
        !self.dry_run && self.out_dir.is_some()
    }
}
