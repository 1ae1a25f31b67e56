//! Run command implementation.
//!
//! `save <TEST_ROOT>` runs every suite below the test root and prints one
//! block per batch.

use std::io::Write;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use crate::cli::args::Cli;
use crate::config::ConfigNode;
use crate::error::Result;
use crate::logging::SharedLogger;
use crate::plugin::{TestResult, TestStatus};
use crate::runner::{run_tree, RunOptions, RunSummary};

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// The run command implementation.
pub struct RunCommand {
    options: RunOptions,
    test_root: PathBuf,
    logger: SharedLogger,
}

impl RunCommand {
    /// Create a run command from parsed arguments.
    pub fn new(cli: &Cli, logger: SharedLogger) -> Self {
        Self {
            options: RunOptions {
                config_name: cli.config_name.clone(),
                fail_fast: cli.fail_fast,
            },
            test_root: cli.test_root.clone(),
            logger,
        }
    }

    /// Run the tree, writing one block per batch to `out`.
    pub fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        // Node directories are absolute, so suite labels are taken relative
        // to the absolute root.
        let test_root = std::path::absolute(&self.test_root)?;
        let mut write_error = None;
        let summary = run_tree(
            &test_root,
            &self.options,
            self.logger.clone(),
            |node, result| match print_result(out, &test_root, node, &result) {
                Ok(()) => ControlFlow::Continue(()),
                Err(e) => {
                    write_error = Some(e);
                    ControlFlow::Break(())
                }
            },
        )?;
        if let Some(e) = write_error {
            return Err(e.into());
        }

        print_summary(out, &summary)?;
        if summary.is_success() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(1))
        }
    }
}

fn print_result(
    out: &mut dyn Write,
    test_root: &Path,
    node: &ConfigNode,
    result: &TestResult,
) -> std::io::Result<()> {
    let suite = match node.directory().strip_prefix(test_root) {
        Ok(relative) if relative.as_os_str().is_empty() => Path::new("."),
        Ok(relative) => relative,
        Err(_) => node.directory(),
    };
    let files: Vec<String> = result
        .resources
        .iter()
        .map(|r| {
            r.test
                .strip_prefix(node.directory())
                .unwrap_or(&r.test)
                .display()
                .to_string()
        })
        .collect();

    match &result.status {
        TestStatus::Completed { exit_code } => writeln!(
            out,
            "[{}] {}: exit code {}, {} warning(s), {} fixed file(s)",
            suite.display(),
            files.join(", "),
            exit_code,
            result.warnings.len(),
            result.fixed.len()
        )?,
        TestStatus::Crashed { message } => writeln!(
            out,
            "[{}] {}: crashed: {}",
            suite.display(),
            files.join(", "),
            message
        )?,
    }
    for warning in &result.warnings {
        writeln!(out, "    {}", warning)?;
    }
    Ok(())
}

fn print_summary(out: &mut dyn Write, summary: &RunSummary) -> std::io::Result<()> {
    for error in &summary.config_errors {
        writeln!(out, "Invalid config {}: {}", error.location.display(), error.message)?;
    }
    writeln!(
        out,
        "{} suite(s), {} batch(es), {} crashed, {} invalid config(s){}",
        summary.suites,
        summary.results,
        summary.crashed,
        summary.config_errors.len(),
        if summary.stopped { ", stopped early" } else { "" }
    )
}
