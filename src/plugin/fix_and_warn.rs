//! Fix-and-warn plugin: fix a batch, then check the warnings that remain.
//!
//! The analyzer runs on the fixed copies inside the fix scratch directory,
//! where they keep their suite-relative paths, so warnings name the same
//! files a plain warn run would.

use std::path::Path;

use super::{FixPlugin, Plugin, PluginContext, TestFiles, TestResult, WarnPlugin};
use crate::config::{ConfigNode, ConfigSection, FixAndWarnPluginConfig, GeneralConfig};
use crate::error::Result;
use crate::logging::SharedLogger;

/// Runs the fix step and the warn step on the same batches.
///
/// Resources are fix pairs whose test file is also a warn test file, so
/// both steps always see identical batches.
pub struct FixAndWarnPlugin {
    fix: FixPlugin,
    warn: WarnPlugin,
    batch_size: usize,
    logger: SharedLogger,
}

impl FixAndWarnPlugin {
    /// Create a plugin from a validated config.
    pub fn new(config: FixAndWarnPluginConfig, ctx: PluginContext) -> Result<Self> {
        let batch_size = config.fix.batch_size.unwrap_or(1);
        let logger = ctx.logger.clone();
        let fix = FixPlugin::new(config.fix, ctx.clone()).with_ignored(config.ignore_lines.clone());
        let warn = WarnPlugin::new(config.warn, ctx)?.with_ignored(config.ignore_lines);
        Ok(Self {
            fix,
            warn,
            batch_size,
            logger,
        })
    }
}

impl Plugin for FixAndWarnPlugin {
    fn section(&self) -> ConfigSection {
        ConfigSection::FixAndWarn
    }

    fn discover_test_files<'a>(
        &'a self,
        directory: &'a Path,
    ) -> Box<dyn Iterator<Item = TestFiles> + 'a> {
        Box::new(
            self.fix
                .discover_test_files(directory)
                .filter(move |files| self.warn.is_test_file(&files.test)),
        )
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn run_batch(
        &self,
        general: &GeneralConfig,
        node: &ConfigNode,
        batch: Vec<TestFiles>,
    ) -> TestResult {
        let fixed = match self.fix.fix_copies(general, node, &batch) {
            Ok(fixed) => fixed,
            Err(e) => return TestResult::crashed(batch, e.to_string()),
        };
        let checked = self
            .warn
            .check_files(general, fixed.root(), &fixed.copies, batch);
        let (execution, files) = fixed.close(&self.logger);
        checked.with_fixed(files).with_fix_execution(execution)
    }
}
