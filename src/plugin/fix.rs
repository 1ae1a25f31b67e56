//! Fix plugin: run a fixer on copies of test files and collect the result.
//!
//! A test resource is a pair of files in the same directory whose stems
//! differ only by suffix, `FooTest.kt` and `FooExpected.kt` by default.
//! The fixer never touches the originals: every batch is copied into a
//! scratch directory that is removed once the fixed content is read.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::{
    batch_runner, build_command, is_ignored, require_exec_cmd, suite_files, FixedFile, Plugin,
    PluginContext, TestFiles, TestResult,
};
use crate::config::validator::{DEFAULT_RESOURCE_NAME_EXPECTED, DEFAULT_RESOURCE_NAME_TEST};
use crate::config::{ConfigNode, ConfigSection, FixPluginConfig, GeneralConfig, LinePatterns};
use crate::error::Result;
use crate::logging::SharedLogger;
use crate::shell::ExecutionResult;

/// Runs the general `execCmd` with `execFlags` on copies of test files.
pub struct FixPlugin {
    config: FixPluginConfig,
    extra_ignore: Vec<LinePatterns>,
    ctx: PluginContext,
}

impl FixPlugin {
    /// Create a plugin from a validated config.
    pub fn new(config: FixPluginConfig, ctx: PluginContext) -> Self {
        Self {
            config,
            extra_ignore: Vec::new(),
            ctx,
        }
    }

    /// Also drop fixed lines matching `patterns`.
    pub fn with_ignored(mut self, patterns: LinePatterns) -> Self {
        self.extra_ignore.push(patterns);
        self
    }

    fn test_suffix(&self) -> &str {
        self.config
            .resource_name_test
            .as_deref()
            .unwrap_or(DEFAULT_RESOURCE_NAME_TEST)
    }

    fn expected_suffix(&self) -> &str {
        self.config
            .resource_name_expected
            .as_deref()
            .unwrap_or(DEFAULT_RESOURCE_NAME_EXPECTED)
    }

    /// The expected counterpart of a test file, if `path` is one.
    pub fn expected_file_for(&self, path: &Path) -> Option<PathBuf> {
        let stem = path.file_stem()?.to_str()?;
        let base = stem.strip_suffix(self.test_suffix())?;
        let mut name = format!("{}{}", base, self.expected_suffix());
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            name.push('.');
            name.push_str(extension);
        }
        Some(path.with_file_name(name))
    }

    /// Copy `batch` into a fresh scratch directory and run the fixer there.
    ///
    /// Copies keep their path relative to the node directory, so a batch
    /// may hold files with the same name from different sub-directories.
    pub(crate) fn fix_copies(
        &self,
        general: &GeneralConfig,
        node: &ConfigNode,
        batch: &[TestFiles],
    ) -> Result<FixedBatch> {
        let exec_cmd = require_exec_cmd(general)?;
        let scratch = tempfile::Builder::new().prefix("save-fix-").tempdir()?;

        let mut copies = Vec::with_capacity(batch.len());
        for files in batch {
            let relative = files
                .test
                .strip_prefix(node.directory())
                .ok()
                .or_else(|| files.test.file_name().map(Path::new))
                .unwrap_or(files.test.as_path());
            let copy = scratch.path().join(relative);
            if let Some(parent) = copy.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&files.test, &copy)?;
            copies.push(copy);
        }

        let names: Vec<String> = copies.iter().map(|c| c.display().to_string()).collect();
        let command = build_command(
            exec_cmd,
            self.config.exec_flags.as_deref().unwrap_or_default(),
            &names,
            self.config.batch_separator.as_deref().unwrap_or(" "),
        );
        let execution =
            batch_runner(&self.ctx.logger, general, node.directory()).exec(&command, None)?;

        let mut patterns = vec![&general.ignore_lines, &self.config.ignore_lines];
        patterns.extend(self.extra_ignore.iter());
        let mut fixed = Vec::with_capacity(batch.len());
        for (files, copy) in batch.iter().zip(&copies) {
            let actual = fs::read_to_string(copy)?
                .lines()
                .filter(|line| !is_ignored(&patterns, line))
                .map(str::to_string)
                .collect();
            fixed.push(FixedFile {
                test: files.test.clone(),
                expected: files.expected.clone(),
                actual,
            });
        }

        Ok(FixedBatch {
            scratch,
            copies,
            execution,
            fixed,
        })
    }
}

/// A fixed batch whose copies stay on disk until [`FixedBatch::close`].
pub(crate) struct FixedBatch {
    scratch: TempDir,
    /// Fixed copies, in batch order.
    pub copies: Vec<PathBuf>,
    pub execution: ExecutionResult,
    pub fixed: Vec<FixedFile>,
}

impl FixedBatch {
    /// Scratch directory holding the copies.
    pub(crate) fn root(&self) -> &Path {
        self.scratch.path()
    }

    /// Remove the copies and return the fix outcome.
    pub(crate) fn close(self, logger: &SharedLogger) -> (ExecutionResult, Vec<FixedFile>) {
        if let Err(e) = self.scratch.close() {
            logger.warn(&format!("Failed to remove fix scratch directory: {}", e));
        }
        (self.execution, self.fixed)
    }
}

impl Plugin for FixPlugin {
    fn section(&self) -> ConfigSection {
        ConfigSection::Fix
    }

    fn discover_test_files<'a>(
        &'a self,
        directory: &'a Path,
    ) -> Box<dyn Iterator<Item = TestFiles> + 'a> {
        Box::new(
            suite_files(directory, &self.ctx.config_name, &self.ctx.logger).filter_map(
                move |path| {
                    let expected = self.expected_file_for(&path)?;
                    expected
                        .is_file()
                        .then(|| TestFiles::with_expected(path, expected))
                },
            ),
        )
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size.unwrap_or(1)
    }

    fn run_batch(
        &self,
        general: &GeneralConfig,
        node: &ConfigNode,
        batch: Vec<TestFiles>,
    ) -> TestResult {
        match self.fix_copies(general, node, &batch) {
            Ok(fixed) => {
                let (execution, fixed) = fixed.close(&self.ctx.logger);
                TestResult::completed(batch, execution).with_fixed(fixed)
            }
            Err(e) => TestResult::crashed(batch, e.to_string()),
        }
    }
}
