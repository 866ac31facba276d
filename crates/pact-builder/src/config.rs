//! Configuration for contract assembly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PactError;
use crate::processor::DEFAULT_MAX_DEPTH;

pub const OUTPUT_DIR_ENV: &str = "PACT_OUTPUT_DIR";
pub const MAX_DEPTH_ENV: &str = "PACT_MAX_DEPTH";
pub const LOG_FILTER_ENV: &str = "PACT_LOG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PactConfig {
    /// Directory contracts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Nesting limit for compiled structures.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./pacts")
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for PactConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_depth: default_max_depth(),
            log_filter: default_log_filter(),
        }
    }
}

impl PactConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PactError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| PactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, PactError> {
        let config: PactConfig = serde_yaml::from_str(contents)
            .map_err(|e| PactError::Config(format!("failed to parse configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `PACT_OUTPUT_DIR`, `PACT_MAX_DEPTH` and `PACT_LOG`.
    pub fn from_env() -> Result<Self, PactError> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(OUTPUT_DIR_ENV) {
            config.output_dir = PathBuf::from(dir);
        }
        if let Ok(depth) = std::env::var(MAX_DEPTH_ENV) {
            config.max_depth = depth.trim().parse().map_err(|_| {
                PactError::Config(format!("{MAX_DEPTH_ENV} must be a positive integer, got '{depth}'"))
            })?;
        }
        if let Ok(filter) = std::env::var(LOG_FILTER_ENV) {
            config.log_filter = filter;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PactError> {
        if self.max_depth == 0 {
            return Err(PactError::Config(
                "maxDepth must be at least 1".to_string(),
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(PactError::Config(
                "outputDir must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
