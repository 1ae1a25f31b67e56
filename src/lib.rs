//! Save - a test engine for static analysis tools.
//!
//! Test suites are directories holding a `save.toml`. Configurations are
//! inherited down the directory hierarchy, and each suite's plugins run
//! the tool under test on batches of test files and turn what it reports
//! into comparable data.
//!
//! # Modules
//!
//! - [`adapter`] - Conversion of analyzer output into warnings
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, merging, validation and the tree
//! - [`error`] - Error types and result aliases
//! - [`logging`] - The injected logger
//! - [`plugin`] - Test discovery and lazy batch execution
//! - [`runner`] - Whole-tree execution
//! - [`shell`] - Shell command execution with captured output
//! - [`warning`] - The warning record
//!
//! # Example
//!
//! ```
//! use save::config::{ConfigSection, FixPluginConfig, PluginConfig};
//!
//! let parent = PluginConfig::Fix(FixPluginConfig {
//!     batch_size: Some(4),
//!     ..Default::default()
//! });
//! let child = PluginConfig::Fix(FixPluginConfig::default());
//!
//! let merged = child.merge_with(&parent).unwrap();
//! assert_eq!(merged.section(), ConfigSection::Fix);
//! ```
//!
//! For running whole trees, see [`runner::run_tree`] and the integration
//! tests.

pub mod adapter;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod plugin;
pub mod runner;
pub mod shell;
pub mod warning;

pub use error::{Result, SaveError};
