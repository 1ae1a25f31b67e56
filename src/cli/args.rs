//! CLI argument definitions.
//!
//! This module defines the CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::Parser;
use std::path::PathBuf;

use crate::config::CONFIG_FILE_NAME;

/// Save - run static analysis tools against hierarchical test suites.
#[derive(Debug, Parser)]
#[command(name = "save")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the root test configuration
    pub test_root: PathBuf,

    /// File name of test configurations
    #[arg(long, default_value = CONFIG_FILE_NAME, env = "SAVE_CONFIG_NAME")]
    pub config_name: String,

    /// Stop at the first crashed batch or invalid configuration
    #[arg(long)]
    pub fail_fast: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let cli = Cli::try_parse_from(["save", "tests"]).unwrap();
        assert_eq!(cli.test_root, PathBuf::from("tests"));
        assert_eq!(cli.config_name, "save.toml");
        assert!(!cli.fail_fast);
        assert!(!cli.debug);
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "save",
            "--debug",
            "--fail-fast",
            "--config-name",
            "suite.toml",
            "tests",
        ])
        .unwrap();
        assert!(cli.debug);
        assert!(cli.fail_fast);
        assert_eq!(cli.config_name, "suite.toml");
    }

    #[test]
    fn test_root_is_required() {
        assert!(Cli::try_parse_from(["save"]).is_err());
    }
}
