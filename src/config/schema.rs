//! Configuration schema definitions.
//!
//! This module defines the types a `save.toml` file deserializes into.
//! Every tunable field is an `Option` so that a field explicitly set in a
//! child config can be told apart from a field it leaves to its ancestors.
//!
//! Merging lives in [`super::merger`], defaults and validation in
//! [`super::validator`].

use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Section of a test configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    General,
    Warn,
    Fix,
    FixAndWarn,
}

impl fmt::Display for ConfigSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfigSection::General => "GENERAL",
            ConfigSection::Warn => "WARN",
            ConfigSection::Fix => "FIX",
            ConfigSection::FixAndWarn => "FIX AND WARN",
        };
        write!(f, "{}", s)
    }
}

/// Compiled regular expressions describing output lines to ignore.
#[derive(Debug, Clone, Default)]
pub struct LinePatterns(Vec<Regex>);

impl LinePatterns {
    /// Compile a list of patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> std::result::Result<Self, regex::Error> {
        patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Whether any pattern matches the line.
    pub fn matches(&self, line: &str) -> bool {
        self.0.iter().any(|re| re.is_match(line))
    }

    /// Whether there are no patterns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Source text of the patterns.
    pub fn as_strs(&self) -> Vec<&str> {
        self.0.iter().map(Regex::as_str).collect()
    }
}

impl PartialEq for LinePatterns {
    fn eq(&self, other: &Self) -> bool {
        self.as_strs() == other.as_strs()
    }
}

impl<'de> Deserialize<'de> for LinePatterns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        LinePatterns::new(&raw).map_err(serde::de::Error::custom)
    }
}

/// Format of the warnings an analyzer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WarningsFormat {
    /// One warning per output line, parsed with a regular expression.
    #[default]
    Plain,
    /// A SARIF 2.1.0 report.
    Sarif,
}

/// `[general]` section: settings shared by every plugin of a suite.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneralConfig {
    /// Command that runs the tool under test.
    pub exec_cmd: Option<String>,

    /// Free-form tags of the suite.
    pub tags: Option<Vec<String>>,

    /// Human readable description.
    pub description: Option<String>,

    /// Name of the suite.
    pub suite_name: Option<String>,

    /// Test file names excluded from discovery.
    pub excluded_tests: Option<Vec<String>>,

    /// Per-invocation timeout of the tool.
    pub time_out_millis: Option<u64>,

    /// Output lines to ignore.
    #[serde(default)]
    pub ignore_lines: LinePatterns,

    /// File that declared this section.
    #[serde(skip)]
    pub config_location: PathBuf,
}

/// `[warn]` section: run an analyzer and collect its warnings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WarnPluginConfig {
    /// Flags appended to the general `execCmd`.
    pub exec_flags: Option<String>,

    /// Regular expression a test file name must fully match.
    pub test_name_regex: Option<String>,

    /// Number of test files passed to one invocation.
    pub batch_size: Option<usize>,

    /// Separator between file names of one batch.
    pub batch_separator: Option<String>,

    /// Regular expression matching one warning in plain output.
    pub actual_warnings_pattern: Option<String>,

    /// Capture group holding the file name.
    pub file_name_capture_group: Option<usize>,

    /// Capture group holding the line number.
    pub line_capture_group: Option<usize>,

    /// Capture group holding the column number.
    pub column_capture_group: Option<usize>,

    /// Capture group holding the message.
    pub message_capture_group: Option<usize>,

    /// Format of the analyzer output.
    pub actual_warnings_format: Option<WarningsFormat>,

    /// Report file written by the analyzer, relative to the suite directory.
    pub actual_warnings_file_name: Option<String>,

    /// Output lines to ignore.
    #[serde(default)]
    pub ignore_lines: LinePatterns,

    /// File that declared this section.
    #[serde(skip)]
    pub config_location: PathBuf,
}

/// `[fix]` section: run a fixer and collect the fixed files.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FixPluginConfig {
    /// Flags appended to the general `execCmd`.
    pub exec_flags: Option<String>,

    /// Number of test files passed to one invocation.
    pub batch_size: Option<usize>,

    /// Separator between file names of one batch.
    pub batch_separator: Option<String>,

    /// File stem suffix of test files (`FooTest.kt`).
    pub resource_name_test: Option<String>,

    /// File stem suffix of expected files (`FooExpected.kt`).
    pub resource_name_expected: Option<String>,

    /// Output lines to ignore.
    #[serde(default)]
    pub ignore_lines: LinePatterns,

    /// File that declared this section.
    #[serde(skip)]
    pub config_location: PathBuf,
}

/// `["fix and warn"]` section: fix files, then check remaining warnings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FixAndWarnPluginConfig {
    /// Nested fix settings.
    #[serde(default)]
    pub fix: FixPluginConfig,

    /// Nested warn settings.
    #[serde(default)]
    pub warn: WarnPluginConfig,

    /// Output lines to ignore.
    #[serde(default)]
    pub ignore_lines: LinePatterns,

    /// File that declared this section.
    #[serde(skip)]
    pub config_location: PathBuf,
}

/// A plugin configuration, tagged by its section.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginConfig {
    General(GeneralConfig),
    Warn(WarnPluginConfig),
    Fix(FixPluginConfig),
    FixAndWarn(FixAndWarnPluginConfig),
}

impl PluginConfig {
    /// Section this config was declared in.
    pub fn section(&self) -> ConfigSection {
        match self {
            PluginConfig::General(_) => ConfigSection::General,
            PluginConfig::Warn(_) => ConfigSection::Warn,
            PluginConfig::Fix(_) => ConfigSection::Fix,
            PluginConfig::FixAndWarn(_) => ConfigSection::FixAndWarn,
        }
    }

    /// File that declared this config.
    pub fn config_location(&self) -> &Path {
        match self {
            PluginConfig::General(c) => &c.config_location,
            PluginConfig::Warn(c) => &c.config_location,
            PluginConfig::Fix(c) => &c.config_location,
            PluginConfig::FixAndWarn(c) => &c.config_location,
        }
    }

    /// Output lines to ignore.
    pub fn ignore_lines(&self) -> &LinePatterns {
        match self {
            PluginConfig::General(c) => &c.ignore_lines,
            PluginConfig::Warn(c) => &c.ignore_lines,
            PluginConfig::Fix(c) => &c.ignore_lines,
            PluginConfig::FixAndWarn(c) => &c.ignore_lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_display_matches_file_tags() {
        assert_eq!(ConfigSection::General.to_string(), "GENERAL");
        assert_eq!(ConfigSection::Warn.to_string(), "WARN");
        assert_eq!(ConfigSection::Fix.to_string(), "FIX");
        assert_eq!(ConfigSection::FixAndWarn.to_string(), "FIX AND WARN");
    }

    #[test]
    fn warn_config_parses_camel_case_keys() {
        let config: WarnPluginConfig = toml::from_str(
            r#"
execFlags = "--json"
batchSize = 2
actualWarningsFormat = "SARIF"
ignoreLines = ["^DEBUG.*"]
"#,
        )
        .unwrap();

        assert_eq!(config.exec_flags.as_deref(), Some("--json"));
        assert_eq!(config.batch_size, Some(2));
        assert_eq!(config.actual_warnings_format, Some(WarningsFormat::Sarif));
        assert!(config.ignore_lines.matches("DEBUG: starting"));
        assert!(config.test_name_regex.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: std::result::Result<FixPluginConfig, _> = toml::from_str("batchSise = 2");
        assert!(result.is_err());
    }

    #[test]
    fn invalid_ignore_pattern_is_rejected() {
        let result: std::result::Result<GeneralConfig, _> = toml::from_str(r#"ignoreLines = ["("]"#);
        assert!(result.is_err());
    }

    #[test]
    fn line_patterns_compare_by_source() {
        let a = LinePatterns::new(&["a+", "b"]).unwrap();
        let b = LinePatterns::new(&["a+", "b"]).unwrap();
        let c = LinePatterns::new(&["b"]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(LinePatterns::default().is_empty());
    }

    #[test]
    fn plugin_config_reports_section() {
        assert_eq!(
            PluginConfig::General(GeneralConfig::default()).section(),
            ConfigSection::General
        );
        assert_eq!(
            PluginConfig::FixAndWarn(FixAndWarnPluginConfig::default()).section(),
            ConfigSection::FixAndWarn
        );
    }
}
