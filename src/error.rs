//! Error types for SAVE operations.
//!
//! This module defines [`SaveError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Configuration errors are fatal for the node (or tree) they belong to
//! - Process errors are fatal for a single invocation only
//! - Adapter errors name the run and result that could not be converted
//! - Use `anyhow::Error` (via `SaveError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigSection;

/// Core error type for SAVE operations.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The configuration hierarchy on disk is malformed.
    #[error("Invalid configuration structure at {path}: {message}")]
    ConfigStructure { path: PathBuf, message: String },

    /// Failed to parse a configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// Two plugin configs with different sections were merged.
    #[error("Cannot merge [{found}] config into [{expected}] config")]
    ConfigMerge {
        expected: ConfigSection,
        found: ConfigSection,
    },

    /// A plugin config failed validation.
    #[error("Invalid [{section}] config in {path}: {message}")]
    ConfigValidation {
        section: ConfigSection,
        path: PathBuf,
        message: String,
    },

    /// An external process could not be run to completion.
    #[error("Failed to execute `{command}`: {message}")]
    ProcessExecution { command: String, message: String },

    /// An analyzer report could not be converted into warnings.
    #[error("Cannot convert result #{result} of run #{run} (uri: {uri:?}): {message}")]
    Adapter {
        run: usize,
        result: usize,
        uri: Option<String>,
        message: String,
    },

    /// An analyzer report could not be decoded at all.
    #[error("Malformed report: {message}")]
    MalformedReport { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for SAVE operations.
pub type Result<T> = std::result::Result<T, SaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_structure_displays_path() {
        let err = SaveError::ConfigStructure {
            path: PathBuf::from("/tests/save.toml"),
            message: "not a regular file".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tests/save.toml"));
        assert!(msg.contains("not a regular file"));
    }

    #[test]
    fn config_merge_displays_both_sections() {
        let err = SaveError::ConfigMerge {
            expected: ConfigSection::Warn,
            found: ConfigSection::Fix,
        };
        assert_eq!(err.to_string(), "Cannot merge [FIX] config into [WARN] config");
    }

    #[test]
    fn config_validation_displays_section_and_message() {
        let err = SaveError::ConfigValidation {
            section: ConfigSection::FixAndWarn,
            path: PathBuf::from("save.toml"),
            message: "batch sizes differ".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("FIX AND WARN"));
        assert!(msg.contains("batch sizes differ"));
    }

    #[test]
    fn process_execution_displays_command() {
        let err = SaveError::ProcessExecution {
            command: "ktlint --format".into(),
            message: "timed out".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ktlint --format"));
        assert!(msg.contains("timed out"));
    }

    #[test]
    fn adapter_error_names_run_and_result() {
        let err = SaveError::Adapter {
            run: 2,
            result: 5,
            uri: Some("http://example.com/a.kt".into()),
            message: "unsupported scheme".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("#5"));
        assert!(msg.contains("#2"));
        assert!(msg.contains("http://example.com/a.kt"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: SaveError = io_err.into();
        assert!(matches!(err, SaveError::Io(_)));
    }
}
