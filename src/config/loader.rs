//! Configuration file discovery and loading.
//!
//! A test configuration file declares up to four sections. Loading one
//! file yields the plugin configs declared locally in it; inheritance
//! from parent directories is applied later by the tree.

use crate::config::schema::{
    FixAndWarnPluginConfig, FixPluginConfig, GeneralConfig, PluginConfig, WarnPluginConfig,
};
use crate::error::{Result, SaveError};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// File name of a test configuration.
pub const CONFIG_FILE_NAME: &str = "save.toml";

/// Raw layout of a configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TestConfigFile {
    #[serde(alias = "GENERAL")]
    general: Option<GeneralConfig>,

    #[serde(alias = "WARN")]
    warn: Option<WarnPluginConfig>,

    #[serde(alias = "FIX")]
    fix: Option<FixPluginConfig>,

    #[serde(rename = "fix and warn", alias = "FIX AND WARN")]
    fix_and_warn: Option<FixAndWarnPluginConfig>,
}

/// Whether `path` names a test configuration file.
pub fn is_config_file(path: &Path, config_name: &str) -> bool {
    path.file_name().is_some_and(|name| name == config_name)
}

/// Parse configuration content into the plugin configs it declares.
///
/// Sections come out in a fixed order: general, warn, fix, fix and warn.
///
/// # Arguments
///
/// * `content` - The TOML content to parse
/// * `source_path` - Recorded as `config_location` and used for errors
pub fn parse_plugin_configs(content: &str, source_path: &Path) -> Result<Vec<PluginConfig>> {
    let file: TestConfigFile = toml::from_str(content).map_err(|e| SaveError::ConfigParse {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })?;

    let location = source_path.to_path_buf();
    let mut configs = Vec::new();

    if let Some(mut general) = file.general {
        general.config_location = location.clone();
        configs.push(PluginConfig::General(general));
    }
    if let Some(mut warn) = file.warn {
        warn.config_location = location.clone();
        configs.push(PluginConfig::Warn(warn));
    }
    if let Some(mut fix) = file.fix {
        fix.config_location = location.clone();
        configs.push(PluginConfig::Fix(fix));
    }
    if let Some(mut fix_and_warn) = file.fix_and_warn {
        fix_and_warn.fix.config_location = location.clone();
        fix_and_warn.warn.config_location = location.clone();
        fix_and_warn.config_location = location;
        configs.push(PluginConfig::FixAndWarn(fix_and_warn));
    }

    Ok(configs)
}

/// Load the plugin configs declared directly in one file.
///
/// # Errors
///
/// Returns `ConfigStructure` if the file doesn't exist.
/// Returns `ConfigParse` if the TOML is invalid.
pub fn load_plugin_configs(path: &Path) -> Result<Vec<PluginConfig>> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SaveError::ConfigStructure {
                path: path.to_path_buf(),
                message: "configuration file not found".to_string(),
            }
        } else {
            SaveError::Io(e)
        }
    })?;

    parse_plugin_configs(&content, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ConfigSection;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn parses_all_sections_in_fixed_order() {
        let content = r#"
["fix and warn"]
[fix]
batchSize = 2
[warn]
execFlags = "--warn"
[general]
execCmd = "ktlint"
"#;
        let configs = parse_plugin_configs(content, Path::new("/t/save.toml")).unwrap();

        let sections: Vec<_> = configs.iter().map(PluginConfig::section).collect();
        assert_eq!(
            sections,
            vec![
                ConfigSection::General,
                ConfigSection::Warn,
                ConfigSection::Fix,
                ConfigSection::FixAndWarn
            ]
        );
        assert!(configs
            .iter()
            .all(|c| c.config_location() == Path::new("/t/save.toml")));
    }

    #[test]
    fn accepts_upper_case_section_names() {
        let content = r#"
[GENERAL]
execCmd = "diktat"

["FIX AND WARN".fix]
batchSize = 3
["FIX AND WARN".warn]
batchSize = 3
"#;
        let configs = parse_plugin_configs(content, Path::new("save.toml")).unwrap();
        assert_eq!(configs.len(), 2);

        let PluginConfig::FixAndWarn(fw) = &configs[1] else {
            panic!("expected fix and warn");
        };
        assert_eq!(fw.fix.batch_size, Some(3));
        assert_eq!(fw.warn.config_location, PathBuf::from("save.toml"));
    }

    #[test]
    fn unknown_section_is_a_parse_error() {
        let err = parse_plugin_configs("[checks]\na = 1", Path::new("/t/save.toml")).unwrap_err();
        assert!(matches!(err, SaveError::ConfigParse { .. }));
        assert!(err.to_string().contains("/t/save.toml"));
    }

    #[test]
    fn empty_file_declares_nothing() {
        let configs = parse_plugin_configs("", Path::new("save.toml")).unwrap();
        assert!(configs.is_empty());
    }

    #[test]
    fn missing_file_is_a_structure_error() {
        let temp = TempDir::new().unwrap();
        let err = load_plugin_configs(&temp.path().join(CONFIG_FILE_NAME)).unwrap_err();
        assert!(matches!(err, SaveError::ConfigStructure { .. }));
    }

    #[test]
    fn recognizes_config_file_names() {
        assert!(is_config_file(Path::new("/a/b/save.toml"), CONFIG_FILE_NAME));
        assert!(!is_config_file(Path::new("/a/b/save.toml.bak"), CONFIG_FILE_NAME));
    }
}
