//! Compiles Pact integration JSON interaction files into contract documents.
//!
//! Each input file describes one contract: a consumer, a provider and the
//! interactions between them, with matchers and generators written in the
//! integration JSON format (`"pact:matcher:type"`, `"pact:generator:type"`).
//! Every problem found is reported as a [`CompileIssue`]; a file without
//! errors is written out as a finished contract.
//!
//! # Example
//!
//! ```no_run
//! use pact_compile::{compile_file, CompileOptions};
//! use std::path::{Path, PathBuf};
//!
//! let options = CompileOptions {
//!     out_dir: Some(PathBuf::from("./pacts")),
//!     ..CompileOptions::default()
//! };
//! let report = compile_file(Path::new("interactions.json"), &options);
//!
//! if report.has_errors() {
//!     eprintln!("Found {} errors", report.errors);
//! }
//! ```

mod reader;
mod types;

use std::path::Path;

use pact_builder::{ContractWriter, JsonFileWriter, Pact, PactError};
use tracing::info;

pub use reader::read_contract;
pub use types::{CompileIssue, CompileOptions, CompileReport, Severity};

/// Compile a single contract description file.
pub fn compile_file(path: &Path, options: &CompileOptions) -> CompileReport {
    let mut report = CompileReport::new();
    report.files_checked = 1;

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            report.add_issue(CompileIssue::error(
                "E001",
                format!("Failed to read file: {e}"),
                path.to_path_buf(),
            ));
            return report;
        }
    };

    let value: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            report.add_issue(
                CompileIssue::error("E002", format!("Invalid JSON: {e}"), path.to_path_buf())
                    .with_suggestion("Check for JSON syntax errors"),
            );
            return report;
        }
    };

    compile_contract(path, &value, &mut report, options);
    report
}

/// Compile every `.json` file in a directory (non-recursive), in file name
/// order.
pub fn compile_directory(path: &Path, options: &CompileOptions) -> CompileReport {
    let mut report = CompileReport::new();

    let entries = match std::fs::read_dir(path) {
        Ok(e) => e,
        Err(e) => {
            report.add_issue(CompileIssue::error(
                "E001",
                format!("Failed to read directory: {e}"),
                path.to_path_buf(),
            ));
            return report;
        }
    };

    let mut files: Vec<_> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|file| file.is_file() && file.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    for file in files {
        report.merge(compile_file(&file, options));
    }
    report
}

/// Compile a JSON string directly.
pub fn compile_json(json: &str, source_name: &str, options: &CompileOptions) -> CompileReport {
    let mut report = CompileReport::new();
    report.files_checked = 1;

    let path = Path::new(source_name);
    let value: serde_json::Value = match serde_json::from_str(json) {
        Ok(v) => v,
        Err(e) => {
            report.add_issue(CompileIssue::error(
                "E002",
                format!("Invalid JSON: {e}"),
                path.to_path_buf(),
            ));
            return report;
        }
    };

    compile_contract(path, &value, &mut report, options);
    report
}

/// Compile an already parsed JSON value.
pub fn compile_value(
    value: &serde_json::Value,
    source_name: &str,
    options: &CompileOptions,
) -> CompileReport {
    let mut report = CompileReport::new();
    report.files_checked = 1;
    compile_contract(Path::new(source_name), value, &mut report, options);
    report
}

fn compile_contract(
    file: &Path,
    value: &serde_json::Value,
    report: &mut CompileReport,
    options: &CompileOptions,
) {
    let errors_before = report.errors;
    let Some(pact) = read_contract(file, value, report, options) else {
        return;
    };
    if report.errors > errors_before || !options.writes() {
        return;
    }
    if let Err(e) = write_contract(file, &pact, report, options) {
        report.add_issue(
            CompileIssue::error("E020", format!("Failed to write contract: {e}"), file.to_path_buf())
                .with_suggestion("Check that the output directory is writable"),
        );
    }
}

fn write_contract(
    file: &Path,
    pact: &Pact,
    report: &mut CompileReport,
    options: &CompileOptions,
) -> Result<(), PactError> {
    let Some(out_dir) = &options.out_dir else {
        return Ok(());
    };
    let document = pact.document()?;
    let written = JsonFileWriter::new(out_dir).write(&document)?;
    info!(
        source = %file.display(),
        contract = %written.display(),
        "compiled contract"
    );
    report.add_issue(
        CompileIssue::info(
            "I001",
            format!("Wrote contract {}", written.display()),
            file.to_path_buf(),
        ),
    );
    report.contracts.push(written);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users_contract() -> serde_json::Value {
        json!({
            "consumer": {"name": "web"},
            "provider": {"name": "users"},
            "interactions": [{
                "description": "a request for a user",
                "request": {"method": "GET", "path": "/users/1"},
                "response": {"status": 200, "body": {"name": {"pact:matcher:type": "type", "value": "Joe"}}}
            }]
        })
    }

    #[test]
    fn test_compile_value_without_out_dir_writes_nothing() {
        let report = compile_value(&users_contract(), "users.json", &CompileOptions::default());
        assert!(report.is_valid());
        assert_eq!(report.interactions_compiled, 1);
        assert!(report.contracts.is_empty());
    }

    #[test]
    fn test_compile_value_writes_clean_contract() {
        let dir = tempfile::tempdir().unwrap();
        let options = CompileOptions {
            out_dir: Some(dir.path().to_path_buf()),
            ..CompileOptions::default()
        };
        let report = compile_value(&users_contract(), "users.json", &options);

        assert_eq!(report.contracts, vec![dir.path().join("web-users.json")]);
        assert_eq!(report.issues[0].code, "I001");
        assert!(dir.path().join("web-users.json").exists());
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let options = CompileOptions {
            out_dir: Some(dir.path().to_path_buf()),
            dry_run: true,
            ..CompileOptions::default()
        };
        let report = compile_value(&users_contract(), "users.json", &options);
        assert!(report.contracts.is_empty());
        assert!(!dir.path().join("web-users.json").exists());
    }

    #[test]
    fn test_contract_with_errors_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let options = CompileOptions {
            out_dir: Some(dir.path().to_path_buf()),
            ..CompileOptions::default()
        };
        let mut contract = users_contract();
        contract["interactions"][0]["response"]["body"] =
            json!({"name": {"pact:matcher:type": "unknown", "value": "Joe"}});
        let report = compile_value(&contract, "users.json", &options);

        assert!(report.has_errors());
        assert!(report.contracts.is_empty());
    }

    #[test]
    fn test_compile_json_reports_syntax_errors() {
        let report = compile_json("{not json", "broken.json", &CompileOptions::default());
        assert_eq!(report.errors, 1);
        assert_eq!(report.issues[0].code, "E002");
    }

    #[test]
    fn test_compile_file_missing() {
        let report = compile_file(Path::new("/nonexistent/contract.json"), &CompileOptions::default());
        assert_eq!(report.issues[0].code, "E001");
    }
}
