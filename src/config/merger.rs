//! Merge algorithm for plugin configurations.
//!
//! A config declared closer to the test files overrides the configs of its
//! ancestors. The nearer config is always the receiver of `merge_with`.
//!
//! # Merge Rules
//!
//! - A field explicitly set on the receiver wins
//! - A field left unset on the receiver falls back to the other config
//! - `config_location` and `ignore_lines` always come from the receiver
//! - Configs of different sections never merge

use crate::config::schema::{
    FixAndWarnPluginConfig, FixPluginConfig, GeneralConfig, PluginConfig, WarnPluginConfig,
};
use crate::error::{Result, SaveError};

/// Pick the receiver's value when set, otherwise the fallback's.
fn pick<T: Clone>(own: &Option<T>, fallback: &Option<T>) -> Option<T> {
    own.as_ref().or(fallback.as_ref()).cloned()
}

impl GeneralConfig {
    /// Merge with a config from an ancestor.
    pub fn merge_with(&self, other: &GeneralConfig) -> GeneralConfig {
        GeneralConfig {
            exec_cmd: pick(&self.exec_cmd, &other.exec_cmd),
            tags: pick(&self.tags, &other.tags),
            description: pick(&self.description, &other.description),
            suite_name: pick(&self.suite_name, &other.suite_name),
            excluded_tests: pick(&self.excluded_tests, &other.excluded_tests),
            time_out_millis: pick(&self.time_out_millis, &other.time_out_millis),
            ignore_lines: self.ignore_lines.clone(),
            config_location: self.config_location.clone(),
        }
    }
}

impl WarnPluginConfig {
    /// Merge with a config from an ancestor.
    pub fn merge_with(&self, other: &WarnPluginConfig) -> WarnPluginConfig {
        WarnPluginConfig {
            exec_flags: pick(&self.exec_flags, &other.exec_flags),
            test_name_regex: pick(&self.test_name_regex, &other.test_name_regex),
            batch_size: pick(&self.batch_size, &other.batch_size),
            batch_separator: pick(&self.batch_separator, &other.batch_separator),
            actual_warnings_pattern: pick(
                &self.actual_warnings_pattern,
                &other.actual_warnings_pattern,
            ),
            file_name_capture_group: pick(
                &self.file_name_capture_group,
                &other.file_name_capture_group,
            ),
            line_capture_group: pick(&self.line_capture_group, &other.line_capture_group),
            column_capture_group: pick(&self.column_capture_group, &other.column_capture_group),
            message_capture_group: pick(&self.message_capture_group, &other.message_capture_group),
            actual_warnings_format: pick(
                &self.actual_warnings_format,
                &other.actual_warnings_format,
            ),
            actual_warnings_file_name: pick(
                &self.actual_warnings_file_name,
                &other.actual_warnings_file_name,
            ),
            ignore_lines: self.ignore_lines.clone(),
            config_location: self.config_location.clone(),
        }
    }
}

impl FixPluginConfig {
    /// Merge with a config from an ancestor.
    pub fn merge_with(&self, other: &FixPluginConfig) -> FixPluginConfig {
        FixPluginConfig {
            exec_flags: pick(&self.exec_flags, &other.exec_flags),
            batch_size: pick(&self.batch_size, &other.batch_size),
            batch_separator: pick(&self.batch_separator, &other.batch_separator),
            resource_name_test: pick(&self.resource_name_test, &other.resource_name_test),
            resource_name_expected: pick(
                &self.resource_name_expected,
                &other.resource_name_expected,
            ),
            ignore_lines: self.ignore_lines.clone(),
            config_location: self.config_location.clone(),
        }
    }
}

impl FixAndWarnPluginConfig {
    /// Merge with a config from an ancestor, section by section.
    pub fn merge_with(&self, other: &FixAndWarnPluginConfig) -> FixAndWarnPluginConfig {
        FixAndWarnPluginConfig {
            fix: self.fix.merge_with(&other.fix),
            warn: self.warn.merge_with(&other.warn),
            ignore_lines: self.ignore_lines.clone(),
            config_location: self.config_location.clone(),
        }
    }
}

impl PluginConfig {
    /// Merge with a config of the same section from an ancestor.
    ///
    /// # Errors
    ///
    /// Returns `ConfigMerge` if the sections differ.
    pub fn merge_with(&self, other: &PluginConfig) -> Result<PluginConfig> {
        match (self, other) {
            (PluginConfig::General(own), PluginConfig::General(other)) => {
                Ok(PluginConfig::General(own.merge_with(other)))
            }
            (PluginConfig::Warn(own), PluginConfig::Warn(other)) => {
                Ok(PluginConfig::Warn(own.merge_with(other)))
            }
            (PluginConfig::Fix(own), PluginConfig::Fix(other)) => {
                Ok(PluginConfig::Fix(own.merge_with(other)))
            }
            (PluginConfig::FixAndWarn(own), PluginConfig::FixAndWarn(other)) => {
                Ok(PluginConfig::FixAndWarn(own.merge_with(other)))
            }
            _ => Err(SaveError::ConfigMerge {
                expected: self.section(),
                found: other.section(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ConfigSection, LinePatterns};
    use std::path::PathBuf;

    fn all_sections() -> Vec<PluginConfig> {
        vec![
            PluginConfig::General(GeneralConfig::default()),
            PluginConfig::Warn(WarnPluginConfig::default()),
            PluginConfig::Fix(FixPluginConfig::default()),
            PluginConfig::FixAndWarn(FixAndWarnPluginConfig::default()),
        ]
    }

    #[test]
    fn merge_fails_for_every_pair_of_distinct_sections() {
        for own in all_sections() {
            for other in all_sections() {
                let result = own.merge_with(&other);
                if own.section() == other.section() {
                    assert!(result.is_ok(), "{} with {}", own.section(), other.section());
                } else {
                    assert!(matches!(
                        result,
                        Err(SaveError::ConfigMerge { expected, found })
                            if expected == own.section() && found == other.section()
                    ));
                }
            }
        }
    }

    #[test]
    fn own_fields_take_priority() {
        let own = WarnPluginConfig {
            batch_size: Some(3),
            ..Default::default()
        };
        let parent = WarnPluginConfig {
            batch_size: Some(1),
            exec_flags: Some("--from-parent".into()),
            ..Default::default()
        };

        let merged = own.merge_with(&parent);

        assert_eq!(merged.batch_size, Some(3));
        assert_eq!(merged.exec_flags.as_deref(), Some("--from-parent"));
        assert!(merged.test_name_regex.is_none());
    }

    #[test]
    fn explicit_value_equal_to_default_still_overrides() {
        let own = FixPluginConfig {
            batch_size: Some(1),
            ..Default::default()
        };
        let parent = FixPluginConfig {
            batch_size: Some(5),
            ..Default::default()
        };

        assert_eq!(own.merge_with(&parent).batch_size, Some(1));
    }

    #[test]
    fn location_and_ignore_lines_come_from_receiver() {
        let own = GeneralConfig {
            config_location: PathBuf::from("/tests/suite/save.toml"),
            ..Default::default()
        };
        let parent = GeneralConfig {
            exec_cmd: Some("ktlint".into()),
            ignore_lines: LinePatterns::new(&["^INFO"]).unwrap(),
            config_location: PathBuf::from("/tests/save.toml"),
            ..Default::default()
        };

        let merged = own.merge_with(&parent);

        assert_eq!(merged.config_location, PathBuf::from("/tests/suite/save.toml"));
        assert!(merged.ignore_lines.is_empty());
        assert_eq!(merged.exec_cmd.as_deref(), Some("ktlint"));
    }

    #[test]
    fn fix_and_warn_delegates_to_nested_sections() {
        let own = FixAndWarnPluginConfig {
            fix: FixPluginConfig {
                batch_size: Some(2),
                ..Default::default()
            },
            ..Default::default()
        };
        let parent = FixAndWarnPluginConfig {
            fix: FixPluginConfig {
                batch_size: Some(4),
                resource_name_test: Some("Before".into()),
                ..Default::default()
            },
            warn: WarnPluginConfig {
                batch_size: Some(4),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = PluginConfig::FixAndWarn(own)
            .merge_with(&PluginConfig::FixAndWarn(parent))
            .unwrap();

        let PluginConfig::FixAndWarn(merged) = merged else {
            panic!("expected a fix and warn config");
        };
        assert_eq!(merged.fix.batch_size, Some(2));
        assert_eq!(merged.fix.resource_name_test.as_deref(), Some("Before"));
        assert_eq!(merged.warn.batch_size, Some(4));
        assert_eq!(ConfigSection::FixAndWarn, PluginConfig::FixAndWarn(merged).section());
    }
}
