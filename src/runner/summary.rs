//! Aggregated outcome of a test tree run.

use std::path::{Path, PathBuf};

use crate::error::SaveError;
use crate::plugin::TestResult;

/// A config node that could not be run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// Config file of the node.
    pub location: PathBuf,

    /// Why it could not be run.
    pub message: String,
}

/// Counts of a test tree run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Suites that had at least one active plugin.
    pub suites: usize,

    /// Batches that produced a result.
    pub results: usize,

    /// Batches that crashed.
    pub crashed: usize,

    /// Nodes rejected during resolution or plugin construction.
    pub config_errors: Vec<ConfigError>,

    /// Whether the run ended before every batch was pulled.
    pub stopped: bool,
}

impl RunSummary {
    pub(crate) fn record_result(&mut self, result: &TestResult) {
        self.results += 1;
        if result.is_crashed() {
            self.crashed += 1;
        }
    }

    pub(crate) fn record_config_error(&mut self, location: &Path, error: &SaveError) {
        self.config_errors.push(ConfigError {
            location: location.to_path_buf(),
            message: error.to_string(),
        });
    }

    /// Whether nothing crashed and every node could be run.
    pub fn is_success(&self) -> bool {
        self.crashed == 0 && self.config_errors.is_empty()
    }
}
