//! Defaults and validation for merged plugin configurations.
//!
//! Validation runs once per node, after the ancestor merge. It fills every
//! unset field with its default and rejects cross-field states that cannot
//! be reconciled. Invalid values are reported, never coerced.

use regex::Regex;

use crate::config::schema::{
    ConfigSection, FixAndWarnPluginConfig, FixPluginConfig, GeneralConfig, PluginConfig,
    WarnPluginConfig, WarningsFormat,
};
use crate::error::{Result, SaveError};

/// Default tool timeout.
pub const DEFAULT_TIMEOUT_MILLIS: u64 = 10_000;
/// Default regex a warn test file name must match.
pub const DEFAULT_TEST_NAME_REGEX: &str = ".*Test.*";
/// Default regex of one plain-text warning: `file:line:column: message`.
pub const DEFAULT_WARNINGS_PATTERN: &str = r"(.+):(\d*):(\d*): (.+)";
/// Default stem suffix of fix test files.
pub const DEFAULT_RESOURCE_NAME_TEST: &str = "Test";
/// Default stem suffix of fix expected files.
pub const DEFAULT_RESOURCE_NAME_EXPECTED: &str = "Expected";

/// Compile a pattern that must match a whole string.
pub fn full_match_regex(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", pattern))
}

fn invalid(section: ConfigSection, location: &std::path::Path, message: String) -> SaveError {
    SaveError::ConfigValidation {
        section,
        path: location.to_path_buf(),
        message,
    }
}

impl GeneralConfig {
    /// Fill defaults and validate.
    pub fn validate_and_set_defaults(&self) -> Result<GeneralConfig> {
        let time_out_millis = self.time_out_millis.unwrap_or(DEFAULT_TIMEOUT_MILLIS);
        if time_out_millis == 0 {
            return Err(invalid(
                ConfigSection::General,
                &self.config_location,
                "timeOutMillis must be positive".to_string(),
            ));
        }

        Ok(GeneralConfig {
            tags: Some(self.tags.clone().unwrap_or_default()),
            excluded_tests: Some(self.excluded_tests.clone().unwrap_or_default()),
            time_out_millis: Some(time_out_millis),
            ..self.clone()
        })
    }
}

impl WarnPluginConfig {
    /// Fill defaults and validate.
    pub fn validate_and_set_defaults(&self) -> Result<WarnPluginConfig> {
        let fail = |message: String| invalid(ConfigSection::Warn, &self.config_location, message);

        let batch_size = self.batch_size.unwrap_or(1);
        if batch_size == 0 {
            return Err(fail("batchSize must be at least 1".to_string()));
        }

        let test_name_regex = self
            .test_name_regex
            .clone()
            .unwrap_or_else(|| DEFAULT_TEST_NAME_REGEX.to_string());
        full_match_regex(&test_name_regex)
            .map_err(|e| fail(format!("invalid testNameRegex `{}`: {}", test_name_regex, e)))?;

        let pattern = self
            .actual_warnings_pattern
            .clone()
            .unwrap_or_else(|| DEFAULT_WARNINGS_PATTERN.to_string());
        let compiled = Regex::new(&pattern)
            .map_err(|e| fail(format!("invalid actualWarningsPattern `{}`: {}", pattern, e)))?;

        let groups = [
            ("fileNameCaptureGroup", self.file_name_capture_group.unwrap_or(1)),
            ("lineCaptureGroup", self.line_capture_group.unwrap_or(2)),
            ("columnCaptureGroup", self.column_capture_group.unwrap_or(3)),
            ("messageCaptureGroup", self.message_capture_group.unwrap_or(4)),
        ];
        let available = compiled.captures_len() - 1;
        for (name, group) in groups {
            if group > available {
                return Err(fail(format!(
                    "{} {} exceeds the {} groups of actualWarningsPattern `{}`",
                    name, group, available, pattern
                )));
            }
        }

        Ok(WarnPluginConfig {
            exec_flags: Some(self.exec_flags.clone().unwrap_or_default()),
            test_name_regex: Some(test_name_regex),
            batch_size: Some(batch_size),
            batch_separator: Some(
                self.batch_separator
                    .clone()
                    .unwrap_or_else(|| ", ".to_string()),
            ),
            actual_warnings_pattern: Some(pattern),
            file_name_capture_group: Some(groups[0].1),
            line_capture_group: Some(groups[1].1),
            column_capture_group: Some(groups[2].1),
            message_capture_group: Some(groups[3].1),
            actual_warnings_format: Some(self.actual_warnings_format.unwrap_or_default()),
            ..self.clone()
        })
    }

    /// Output format after defaults.
    pub fn format(&self) -> WarningsFormat {
        self.actual_warnings_format.unwrap_or_default()
    }
}

impl FixPluginConfig {
    /// Fill defaults and validate.
    pub fn validate_and_set_defaults(&self) -> Result<FixPluginConfig> {
        let fail = |message: String| invalid(ConfigSection::Fix, &self.config_location, message);

        let batch_size = self.batch_size.unwrap_or(1);
        if batch_size == 0 {
            return Err(fail("batchSize must be at least 1".to_string()));
        }

        let test = self
            .resource_name_test
            .clone()
            .unwrap_or_else(|| DEFAULT_RESOURCE_NAME_TEST.to_string());
        let expected = self
            .resource_name_expected
            .clone()
            .unwrap_or_else(|| DEFAULT_RESOURCE_NAME_EXPECTED.to_string());
        if test.is_empty() || test == expected {
            return Err(fail(format!(
                "resourceNameTest `{}` and resourceNameExpected `{}` must be distinct and non-empty",
                test, expected
            )));
        }

        Ok(FixPluginConfig {
            exec_flags: Some(self.exec_flags.clone().unwrap_or_default()),
            batch_size: Some(batch_size),
            batch_separator: Some(
                self.batch_separator
                    .clone()
                    .unwrap_or_else(|| " ".to_string()),
            ),
            resource_name_test: Some(test),
            resource_name_expected: Some(expected),
            ..self.clone()
        })
    }
}

impl FixAndWarnPluginConfig {
    /// Validate both nested sections, then the invariant binding them.
    ///
    /// Fix test files must be warn test files too, and both steps must
    /// see the same batches.
    pub fn validate_and_set_defaults(&self) -> Result<FixAndWarnPluginConfig> {
        let fix = self.fix.validate_and_set_defaults()?;
        let warn = self.warn.validate_and_set_defaults()?;

        let test_name_regex = warn.test_name_regex.clone().unwrap_or_default();
        let resource_name_test = fix.resource_name_test.clone().unwrap_or_default();
        let names_match = full_match_regex(&test_name_regex)
            .map(|re| re.is_match(&resource_name_test))
            .unwrap_or(false);

        if !names_match || fix.batch_size != warn.batch_size {
            return Err(invalid(
                ConfigSection::FixAndWarn,
                &self.config_location,
                format!(
                    "[fix] files must match the [warn] test name regex and both batch sizes must be equal, \
                     but found [fix]: {{{}, {}}}, [warn]: {{{}, {}}}",
                    resource_name_test,
                    fix.batch_size.unwrap_or_default(),
                    test_name_regex,
                    warn.batch_size.unwrap_or_default()
                ),
            ));
        }

        Ok(FixAndWarnPluginConfig {
            fix,
            warn,
            ignore_lines: self.ignore_lines.clone(),
            config_location: self.config_location.clone(),
        })
    }
}

impl PluginConfig {
    /// Fill defaults and validate, keeping the section.
    pub fn validate_and_set_defaults(&self) -> Result<PluginConfig> {
        Ok(match self {
            PluginConfig::General(c) => PluginConfig::General(c.validate_and_set_defaults()?),
            PluginConfig::Warn(c) => PluginConfig::Warn(c.validate_and_set_defaults()?),
            PluginConfig::Fix(c) => PluginConfig::Fix(c.validate_and_set_defaults()?),
            PluginConfig::FixAndWarn(c) => {
                PluginConfig::FixAndWarn(c.validate_and_set_defaults()?)
            }
        })
    }
}
