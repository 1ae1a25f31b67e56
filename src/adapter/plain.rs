//! Line-oriented analyzer output adapter.

use super::{AdapterContext, WarningAdapter};
use crate::config::WarnPluginConfig;
use crate::config::validator::DEFAULT_WARNINGS_PATTERN;
use crate::error::{Result, SaveError};
use crate::warning::Warning;
use regex::{Captures, Regex};
use std::path::PathBuf;

/// Parses one warning per matching output line.
///
/// A capture group index of `0` means the value is not captured: line and
/// column then default to 1 and the file defaults to
/// [`with_default_file`](Self::with_default_file).
#[derive(Debug, Clone)]
pub struct PlainWarningAdapter {
    pattern: Regex,
    file_group: usize,
    line_group: usize,
    column_group: usize,
    message_group: usize,
    default_file: Option<PathBuf>,
}

impl PlainWarningAdapter {
    /// Build from a validated warn config.
    pub fn from_config(config: &WarnPluginConfig) -> Result<Self> {
        let source = config
            .actual_warnings_pattern
            .as_deref()
            .unwrap_or(DEFAULT_WARNINGS_PATTERN);
        let pattern = Regex::new(source).map_err(|e| anyhow::anyhow!(e))?;
        Ok(Self {
            pattern,
            file_group: config.file_name_capture_group.unwrap_or(1),
            line_group: config.line_capture_group.unwrap_or(2),
            column_group: config.column_capture_group.unwrap_or(3),
            message_group: config.message_capture_group.unwrap_or(4),
            default_file: None,
        })
    }

    /// File assigned to warnings whose line names none.
    pub fn with_default_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.default_file = Some(file.into());
        self
    }

    fn group<'t>(&self, caps: &Captures<'t>, index: usize) -> Option<&'t str> {
        if index == 0 {
            return None;
        }
        caps.get(index)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
    }

    fn number(&self, caps: &Captures<'_>, index: usize) -> u32 {
        self.group(caps, index)
            .and_then(|s| s.parse().ok())
            .unwrap_or(1)
    }
}

impl WarningAdapter for PlainWarningAdapter {
    type Report = [String];

    fn to_warnings(&self, lines: &[String], ctx: &AdapterContext) -> Result<Vec<Warning>> {
        let mut warnings = Vec::new();

        for (index, line) in lines.iter().enumerate() {
            let Some(caps) = self.pattern.captures(line) else {
                continue;
            };
            let adapter_error = |uri: Option<String>, message: String| SaveError::Adapter {
                run: 0,
                result: index,
                uri,
                message,
            };

            let absolute = match self.group(&caps, self.file_group) {
                Some(raw) => ctx
                    .resolve(raw)
                    .map_err(|message| adapter_error(Some(raw.to_string()), message))?,
                None => match &self.default_file {
                    Some(file) => ctx.test_root.join(file),
                    None => {
                        return Err(adapter_error(
                            None,
                            format!("cannot tell which file `{}` refers to", line),
                        ))
                    }
                },
            };
            let Some(file_name) = ctx.scoped_file_name(&absolute) else {
                continue;
            };

            warnings.push(Warning::new(
                self.group(&caps, self.message_group).unwrap_or_default(),
                self.number(&caps, self.line_group),
                self.number(&caps, self.column_group),
                file_name,
            ));
        }

        Ok(warnings)
    }
}
