//! # CLI Error Types
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Importer Error Categories                         │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Input       │  │       Outcome           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  ConfigParse    │  │  Read           │  │  Rejected               │ │
//! │  │  InvalidConfig  │  │  Json           │  │  TooManyRecords         │ │
//! │  │  Schema         │  │  Io, Report     │  │                         │ │
//! │  │  Logging        │  │  UnknownEntity  │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rejected records are not errors by themselves; they become
//! [`CliError::Rejected`] only when `fail_on_reject` is set.

use std::path::PathBuf;

use intake_core::{SchemaError, UnknownEntity};
use thiserror::Error;

/// Result type alias for importer operations.
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Config file is not valid TOML for [`crate::config::IntakeConfig`].
    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config parsed but holds unusable values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A declared schema failed to build.
    #[error("Schema construction failed: {0}")]
    Schema(#[from] SchemaError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Whole-document JSON input that does not parse.
    #[error("Invalid JSON at line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write report: {0}")]
    Report(#[from] serde_json::Error),

    #[error(transparent)]
    UnknownEntity(#[from] UnknownEntity),

    // =========================================================================
    // Outcome Errors
    // =========================================================================
    #[error("{rejected} of {total} records rejected")]
    Rejected { rejected: usize, total: usize },

    #[error("Input holds {found} records, more than the configured limit of {limit}")]
    TooManyRecords { found: usize, limit: usize },
}

impl CliError {
    /// Process exit code: 2 for rejected input, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Rejected { .. } => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::Rejected {
                rejected: 1,
                total: 3
            }
            .exit_code(),
            2
        );
        assert_eq!(CliError::InvalidConfig("x".into()).exit_code(), 1);
    }

    #[test]
    fn test_unknown_entity_message_passes_through() {
        let error = CliError::from(UnknownEntity("invoice".to_string()));
        assert!(error.to_string().starts_with("unknown entity kind 'invoice'"));
    }
}
