//! Warn plugin: run an analyzer and collect the warnings it reports.

use std::path::{Path, PathBuf};

use regex::Regex;

use super::{
    batch_runner, build_command, is_ignored, require_exec_cmd, suite_files, Plugin,
    PluginContext, TestFiles, TestResult,
};
use crate::adapter::{
    AdapterContext, PlainWarningAdapter, SarifReport, SarifWarningAdapter, WarningAdapter,
};
use crate::config::validator::DEFAULT_TEST_NAME_REGEX;
use crate::config::{
    full_match_regex, ConfigNode, ConfigSection, GeneralConfig, LinePatterns, WarnPluginConfig,
    WarningsFormat,
};
use crate::error::Result;
use crate::shell::ExecutionResult;
use crate::warning::Warning;

/// Runs the general `execCmd` with `execFlags` on batches of test files.
pub struct WarnPlugin {
    config: WarnPluginConfig,
    test_name: Regex,
    extra_ignore: Vec<LinePatterns>,
    ctx: PluginContext,
}

impl WarnPlugin {
    /// Create a plugin from a validated config.
    pub fn new(config: WarnPluginConfig, ctx: PluginContext) -> Result<Self> {
        let source = config
            .test_name_regex
            .as_deref()
            .unwrap_or(DEFAULT_TEST_NAME_REGEX);
        let test_name = full_match_regex(source).map_err(|e| anyhow::anyhow!(e))?;
        Ok(Self {
            config,
            test_name,
            extra_ignore: Vec::new(),
            ctx,
        })
    }

    /// Also drop output lines matching `patterns`.
    pub fn with_ignored(mut self, patterns: LinePatterns) -> Self {
        self.extra_ignore.push(patterns);
        self
    }

    /// Whether a file name is a warn test file.
    pub fn is_test_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.test_name.is_match(name))
    }

    fn ignored_lines(&self, general: &GeneralConfig, stdout: &[String]) -> Vec<String> {
        let mut patterns = vec![&general.ignore_lines, &self.config.ignore_lines];
        patterns.extend(self.extra_ignore.iter());
        stdout
            .iter()
            .filter(|line| !is_ignored(&patterns, line))
            .cloned()
            .collect()
    }

    fn collect_warnings(
        &self,
        general: &GeneralConfig,
        workdir: &Path,
        files: &[PathBuf],
        execution: &ExecutionResult,
    ) -> Result<Vec<Warning>> {
        let scope = AdapterContext::new(workdir, files.iter().cloned());
        let lines = self.ignored_lines(general, &execution.stdout);

        match self.config.format() {
            WarningsFormat::Plain => {
                let mut adapter = PlainWarningAdapter::from_config(&self.config)?;
                if let Some(first) = files.first() {
                    adapter = adapter.with_default_file(first);
                }
                adapter.to_warnings(&lines, &scope)
            }
            WarningsFormat::Sarif => {
                let report = match &self.config.actual_warnings_file_name {
                    Some(name) => SarifReport::from_file(&workdir.join(name))?,
                    None => SarifReport::from_json(&lines.join("\n"))?,
                };
                SarifWarningAdapter.to_warnings(&report, &scope)
            }
        }
    }

    fn warn_files(
        &self,
        general: &GeneralConfig,
        workdir: &Path,
        files: &[PathBuf],
    ) -> Result<ExecutionResult> {
        let exec_cmd = require_exec_cmd(general)?;
        let files: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
        let command = build_command(
            exec_cmd,
            self.config.exec_flags.as_deref().unwrap_or_default(),
            &files,
            self.config.batch_separator.as_deref().unwrap_or(", "),
        );
        batch_runner(&self.ctx.logger, general, workdir).exec(&command, None)
    }

    /// Run the analyzer on `files` from `workdir` and report for `resources`.
    ///
    /// Warnings are scoped to `files` and named relative to `workdir`.
    pub(crate) fn check_files(
        &self,
        general: &GeneralConfig,
        workdir: &Path,
        files: &[PathBuf],
        resources: Vec<TestFiles>,
    ) -> TestResult {
        let execution = match self.warn_files(general, workdir, files) {
            Ok(execution) => execution,
            Err(e) => return TestResult::crashed(resources, e.to_string()),
        };
        match self.collect_warnings(general, workdir, files, &execution) {
            Ok(warnings) => TestResult::completed(resources, execution).with_warnings(warnings),
            Err(e) => TestResult::crashed(resources, e.to_string()).with_execution(execution),
        }
    }
}

impl Plugin for WarnPlugin {
    fn section(&self) -> ConfigSection {
        ConfigSection::Warn
    }

    fn discover_test_files<'a>(
        &'a self,
        directory: &'a Path,
    ) -> Box<dyn Iterator<Item = TestFiles> + 'a> {
        Box::new(
            suite_files(directory, &self.ctx.config_name, &self.ctx.logger)
                .filter(move |path| self.is_test_file(path))
                .map(TestFiles::single),
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
        let files: Vec<PathBuf> = batch.iter().map(|f| f.test.clone()).collect();
        self.check_files(general, node.directory(), &files, batch)
    }
}
