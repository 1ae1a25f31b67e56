//! Plugins: executable test behavior bound to a resolved config node.
//!
//! A plugin discovers its test files in a suite directory, groups them in
//! batches and produces one [`TestResult`] per batch. Results are produced
//! lazily: pulling the next result runs exactly one batch, and dropping the
//! iterator leaves the remaining batches untouched.
//!
//! # Plugins
//!
//! - [`WarnPlugin`] - runs an analyzer and collects its warnings
//! - [`FixPlugin`] - runs a fixer on copies of the test files
//! - [`FixAndWarnPlugin`] - fixes, then collects the remaining warnings

pub mod fix;
pub mod fix_and_warn;
pub mod warn;

use std::path::{Path, PathBuf};
use std::time::Duration;

use walkdir::WalkDir;

use crate::config::validator::DEFAULT_TIMEOUT_MILLIS;
use crate::config::{
    is_config_file, ConfigNode, ConfigSection, GeneralConfig, LinePatterns, PluginConfig,
};
use crate::error::{Result, SaveError};
use crate::logging::SharedLogger;
use crate::shell::{ExecutionResult, ProcessRunner};
use crate::warning::Warning;

pub use fix::FixPlugin;
pub use fix_and_warn::FixAndWarnPlugin;
pub use warn::WarnPlugin;

/// One discovered test resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFiles {
    /// File the tool runs on.
    pub test: PathBuf,

    /// Expected counterpart, for fix-style plugins.
    pub expected: Option<PathBuf>,
}

impl TestFiles {
    /// A test file without an expected counterpart.
    pub fn single(test: impl Into<PathBuf>) -> Self {
        Self {
            test: test.into(),
            expected: None,
        }
    }

    /// A test file with its expected counterpart.
    pub fn with_expected(test: impl Into<PathBuf>, expected: impl Into<PathBuf>) -> Self {
        Self {
            test: test.into(),
            expected: Some(expected.into()),
        }
    }
}

/// Content a fixer produced for one test file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedFile {
    /// Original test file.
    pub test: PathBuf,

    /// Expected counterpart.
    pub expected: Option<PathBuf>,

    /// Fixed content, without ignored lines.
    pub actual: Vec<String>,
}

/// How a batch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestStatus {
    /// The tool ran to completion.
    Completed { exit_code: i32 },

    /// The batch could not be run or its output could not be read.
    Crashed { message: String },
}

/// Result of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    /// Test resources of the batch.
    pub resources: Vec<TestFiles>,

    /// How the batch ended.
    pub status: TestStatus,

    /// Raw process outcome, if the tool ran.
    pub execution: Option<ExecutionResult>,

    /// Outcome of the fix step of a fix-and-warn batch.
    pub fix_execution: Option<ExecutionResult>,

    /// Warnings the tool reported.
    pub warnings: Vec<Warning>,

    /// Files the tool fixed.
    pub fixed: Vec<FixedFile>,
}

impl TestResult {
    /// A batch whose tool ran to completion.
    pub fn completed(resources: Vec<TestFiles>, execution: ExecutionResult) -> Self {
        Self {
            resources,
            status: TestStatus::Completed {
                exit_code: execution.code,
            },
            execution: Some(execution),
            fix_execution: None,
            warnings: Vec::new(),
            fixed: Vec::new(),
        }
    }

    /// A batch that could not be run.
    pub fn crashed(resources: Vec<TestFiles>, message: impl Into<String>) -> Self {
        Self {
            resources,
            status: TestStatus::Crashed {
                message: message.into(),
            },
            execution: None,
            fix_execution: None,
            warnings: Vec::new(),
            fixed: Vec::new(),
        }
    }

    /// Attach the raw process outcome.
    pub fn with_execution(mut self, execution: ExecutionResult) -> Self {
        self.execution = Some(execution);
        self
    }

    /// Attach the outcome of a preceding fix step.
    ///
    /// A failing fixer decides the exit code of an otherwise successful
    /// batch.
    pub fn with_fix_execution(mut self, execution: ExecutionResult) -> Self {
        if let TestStatus::Completed { exit_code: 0 } = self.status {
            self.status = TestStatus::Completed {
                exit_code: execution.code,
            };
        }
        self.fix_execution = Some(execution);
        self
    }

    /// Attach warnings.
    pub fn with_warnings(mut self, warnings: Vec<Warning>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Attach fixed files.
    pub fn with_fixed(mut self, fixed: Vec<FixedFile>) -> Self {
        self.fixed = fixed;
        self
    }

    /// Whether the batch crashed.
    pub fn is_crashed(&self) -> bool {
        matches!(self.status, TestStatus::Crashed { .. })
    }
}

/// Executable behavior bound to one resolved config node.
pub trait Plugin {
    /// Section the plugin was configured by.
    fn section(&self) -> ConfigSection;

    /// Lazily discover test resources in `directory`.
    ///
    /// Sub-directories that hold their own config file belong to another
    /// node and are not searched. Each call starts a fresh walk.
    fn discover_test_files<'a>(
        &'a self,
        directory: &'a Path,
    ) -> Box<dyn Iterator<Item = TestFiles> + 'a>;

    /// Number of resources per batch.
    fn batch_size(&self) -> usize;

    /// Run one batch.
    fn run_batch(
        &self,
        general: &GeneralConfig,
        node: &ConfigNode,
        batch: Vec<TestFiles>,
    ) -> TestResult;

    /// Lazily run every batch of the node.
    fn execute<'a>(
        &'a self,
        general: &'a GeneralConfig,
        node: &'a ConfigNode,
    ) -> Box<dyn Iterator<Item = TestResult> + 'a> {
        let excluded = general.excluded_tests.clone().unwrap_or_default();
        let files = self
            .discover_test_files(node.directory())
            .filter(move |files| !excluded.iter().any(|e| files.test.ends_with(e)));
        Box::new(
            batches(files, self.batch_size())
                .map(move |batch| self.run_batch(general, node, batch)),
        )
    }
}

/// Settings shared by every plugin of a run.
#[derive(Clone)]
pub struct PluginContext {
    /// Sink for diagnostics.
    pub logger: SharedLogger,

    /// File name of test configurations.
    pub config_name: String,
}

impl PluginContext {
    /// Create a context.
    pub fn new(logger: SharedLogger, config_name: impl Into<String>) -> Self {
        Self {
            logger,
            config_name: config_name.into(),
        }
    }

    /// Construct the plugin for a non-general config.
    ///
    /// # Errors
    ///
    /// Returns an error for `[general]`, which configures no plugin.
    pub fn create_plugin(
        &self,
        config: &PluginConfig,
        node: &ConfigNode,
    ) -> Result<Box<dyn Plugin>> {
        self.logger.debug(&format!(
            "Creating [{}] plugin for {}",
            config.section(),
            node.location().display()
        ));
        match config {
            PluginConfig::Warn(c) => Ok(Box::new(WarnPlugin::new(c.clone(), self.clone())?)),
            PluginConfig::Fix(c) => Ok(Box::new(FixPlugin::new(c.clone(), self.clone()))),
            PluginConfig::FixAndWarn(c) => {
                Ok(Box::new(FixAndWarnPlugin::new(c.clone(), self.clone())?))
            }
            PluginConfig::General(_) => Err(SaveError::Other(anyhow::anyhow!(
                "[general] section of {} does not configure a plugin",
                node.location().display()
            ))),
        }
    }
}

/// Groups items of an iterator, pulling each group on demand.
pub struct Batches<I> {
    inner: I,
    size: usize,
}

impl<I: Iterator> Iterator for Batches<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<_> = self.inner.by_ref().take(self.size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

/// Split `items` into batches of `size` (at least 1).
pub fn batches<I: IntoIterator>(items: I, size: usize) -> Batches<I::IntoIter> {
    Batches {
        inner: items.into_iter(),
        size: size.max(1),
    }
}

/// Files of a suite directory, excluding directories owned by other
/// configs and the config files themselves.
///
/// Entries that cannot be read are logged as warnings and skipped.
pub(crate) fn suite_files<'a>(
    directory: &'a Path,
    config_name: &'a str,
    logger: &'a SharedLogger,
) -> impl Iterator<Item = PathBuf> + 'a {
    WalkDir::new(directory)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry.path().join(config_name).is_file()
        })
        .filter_map(move |entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                logger.warn(&format!(
                    "Skipping unreadable entry below {}: {}",
                    directory.display(),
                    e
                ));
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(move |path| !is_config_file(path, config_name))
}

/// Command line of one batch.
pub(crate) fn build_command(exec_cmd: &str, flags: &str, files: &[String], separator: &str) -> String {
    let mut parts = vec![exec_cmd.trim().to_string()];
    if !flags.trim().is_empty() {
        parts.push(flags.trim().to_string());
    }
    if !files.is_empty() {
        parts.push(files.join(separator));
    }
    parts.join(" ")
}

/// The general `execCmd`, which every plugin needs.
pub(crate) fn require_exec_cmd(general: &GeneralConfig) -> Result<&str> {
    general
        .exec_cmd
        .as_deref()
        .filter(|cmd| !cmd.trim().is_empty())
        .ok_or_else(|| SaveError::ConfigValidation {
            section: ConfigSection::General,
            path: general.config_location.clone(),
            message: "execCmd is not set".to_string(),
        })
}

/// A process runner for one batch, working in `workdir`.
pub(crate) fn batch_runner(
    logger: &SharedLogger,
    general: &GeneralConfig,
    workdir: &Path,
) -> ProcessRunner {
    let millis = general.time_out_millis.unwrap_or(DEFAULT_TIMEOUT_MILLIS);
    ProcessRunner::new(logger.clone())
        .with_cwd(workdir)
        .with_timeout(Duration::from_millis(millis))
}

/// Whether a line is dropped by any of the pattern sets.
pub(crate) fn is_ignored(patterns: &[&LinePatterns], line: &str) -> bool {
    patterns.iter().any(|p| p.matches(line))
}
