//! Test configuration: schema, loading, merging, validation and the tree.
//!
//! This module handles all aspects of configuration:
//! - Schema definitions in [`schema`]
//! - File loading in [`loader`]
//! - Merging with ancestors in [`merger`]
//! - Defaults and validation in [`validator`]
//! - The directory-derived hierarchy in [`tree`]
//!
//! # Example
//!
//! ```
//! use save::config::{load_plugin_configs, ConfigTree, CONFIG_FILE_NAME};
//! use save::logging::TracingLogger;
//! use std::fs;
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! fs::write(temp.path().join(CONFIG_FILE_NAME), "[warn]\nbatchSize = 2").unwrap();
//! fs::create_dir(temp.path().join("suite")).unwrap();
//! fs::write(temp.path().join("suite").join(CONFIG_FILE_NAME), "[warn]\nexecFlags = \"-v\"").unwrap();
//!
//! let mut tree = ConfigTree::discover(temp.path(), CONFIG_FILE_NAME, TracingLogger::shared()).unwrap();
//! let resolution = tree.resolve_all(|node| load_plugin_configs(node.location()));
//! assert!(resolution.failed.is_empty());
//! assert_eq!(tree.len(), 2);
//! ```

pub mod loader;
pub mod merger;
pub mod schema;
pub mod tree;
pub mod validator;

// Schema re-exports
pub use schema::{
    ConfigSection, FixAndWarnPluginConfig, FixPluginConfig, GeneralConfig, LinePatterns,
    PluginConfig, WarnPluginConfig, WarningsFormat,
};

// Loader re-exports
pub use loader::{is_config_file, load_plugin_configs, parse_plugin_configs, CONFIG_FILE_NAME};

// Tree re-exports
pub use tree::{ConfigNode, ConfigTree, NodeId, ParentChain, Resolution};

// Validator re-exports
pub use validator::full_match_regex;
