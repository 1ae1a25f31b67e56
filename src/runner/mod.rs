//! Test tree execution.
//!
//! Ties the pieces together: discover the config tree below a test root,
//! resolve every node, build each node's active plugins and pull their
//! results one batch at a time into a caller-supplied sink.

pub mod summary;

use std::ops::ControlFlow;
use std::path::Path;

use crate::config::{
    load_plugin_configs, ConfigNode, ConfigTree, GeneralConfig, CONFIG_FILE_NAME,
};
use crate::error::Result;
use crate::logging::SharedLogger;
use crate::plugin::{PluginContext, TestResult};

pub use summary::{ConfigError, RunSummary};

/// Options for running a test tree.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// File name of test configurations.
    pub config_name: String,

    /// Stop at the first crashed batch or configuration error.
    pub fail_fast: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            config_name: CONFIG_FILE_NAME.to_string(),
            fail_fast: false,
        }
    }
}

/// Run every suite below `root`.
///
/// Results are handed to `sink` as soon as their batch finishes; returning
/// [`ControlFlow::Break`] stops the run without starting another batch.
/// A node whose configuration is invalid is recorded in the summary and
/// its siblings still run.
///
/// # Errors
///
/// Returns an error only if the tree itself cannot be built, for example
/// when `root` has no config file.
pub fn run_tree<F>(
    root: &Path,
    options: &RunOptions,
    logger: SharedLogger,
    mut sink: F,
) -> Result<RunSummary>
where
    F: FnMut(&ConfigNode, TestResult) -> ControlFlow<()>,
{
    let mut tree = ConfigTree::discover(root, &options.config_name, logger.clone())?;
    let resolution = tree.resolve_all(|node| load_plugin_configs(node.location()));

    let mut summary = RunSummary::default();
    for (id, error) in &resolution.failed {
        summary.record_config_error(tree.node(*id).location(), error);
    }
    for id in &resolution.skipped {
        logger.debug(&format!(
            "Not running {}: an enclosing config is invalid",
            tree.node(*id).location().display()
        ));
    }
    if options.fail_fast && !summary.config_errors.is_empty() {
        summary.stopped = true;
        return Ok(summary);
    }

    let ctx = PluginContext::new(logger.clone(), options.config_name.clone());
    let Some(root_id) = tree.root() else {
        return Ok(summary);
    };

    for id in tree.all_descendants(root_id) {
        if !resolution.is_resolved(id) {
            continue;
        }
        let node = tree.node(id);
        let plugins = match tree.build_active_plugins(id, |config, node| {
            ctx.create_plugin(config, node)
        }) {
            Ok(plugins) => plugins,
            Err(e) => {
                logger.warn(&format!("Skipping {}: {}", node.location().display(), e));
                summary.record_config_error(node.location(), &e);
                if options.fail_fast {
                    summary.stopped = true;
                    return Ok(summary);
                }
                continue;
            }
        };
        if plugins.is_empty() {
            continue;
        }

        let general = node.general_config().cloned().unwrap_or_else(GeneralConfig::default);
        logger.info(&format!(
            "Running suite {} ({})",
            general.suite_name.as_deref().unwrap_or("unnamed"),
            node.directory().display()
        ));
        summary.suites += 1;

        for plugin in &plugins {
            for result in plugin.execute(&general, node) {
                let crashed = result.is_crashed();
                summary.record_result(&result);
                if crashed {
                    logger.warn(&format!(
                        "[{}] batch crashed in {}",
                        plugin.section(),
                        node.directory().display()
                    ));
                }
                if sink(node, result).is_break() || (crashed && options.fail_fast) {
                    summary.stopped = true;
                    return Ok(summary);
                }
            }
        }
    }

    Ok(summary)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::logging::MemoryLogger;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn logger() -> SharedLogger {
        Arc::new(MemoryLogger::new())
    }

    fn write(dir: &Path, name: &str, content: &str) {
        fs::create_dir_all(dir.join(name).parent().unwrap()).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn runs_every_suite_and_collects_results() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "save.toml", "[general]\nexecCmd = \"true\"\n[warn]");
        write(temp.path(), "ATest.kt", "");
        write(temp.path(), "nested/save.toml", "[warn]\nexecFlags = \"-v\"");
        write(temp.path(), "nested/BTest.kt", "");

        let mut seen = Vec::new();
        let summary = run_tree(temp.path(), &RunOptions::default(), logger(), |node, result| {
            seen.push((node.directory().to_path_buf(), result.resources[0].test.clone()));
            ControlFlow::Continue(())
        })
        .unwrap();

        assert_eq!(summary.suites, 2);
        assert_eq!(summary.results, 2);
        assert_eq!(summary.crashed, 0);
        assert!(summary.is_success());
        assert_eq!(seen[0].1, temp.path().join("ATest.kt"));
        assert_eq!(seen[1].1, temp.path().join("nested/BTest.kt"));
    }

    #[test]
    fn invalid_node_does_not_stop_its_sibling() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "save.toml", "[general]\nexecCmd = \"true\"");
        write(temp.path(), "bad/save.toml", "[warn]\nbatchSize = 0");
        write(temp.path(), "bad/ATest.kt", "");
        write(temp.path(), "good/save.toml", "[warn]");
        write(temp.path(), "good/BTest.kt", "");

        let summary =
            run_tree(temp.path(), &RunOptions::default(), logger(), |_, _| ControlFlow::Continue(()))
                .unwrap();

        assert_eq!(summary.results, 1);
        assert_eq!(summary.config_errors.len(), 1);
        assert_eq!(summary.config_errors[0].location, temp.path().join("bad/save.toml"));
        assert!(!summary.is_success());
    }

    #[test]
    fn fail_fast_stops_before_running_anything_on_config_errors() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "save.toml", "[general]\nexecCmd = \"true\"");
        write(temp.path(), "bad/save.toml", "[warn]\nbatchSize = 0");
        write(temp.path(), "good/save.toml", "[warn]");
        write(temp.path(), "good/BTest.kt", "");
        let options = RunOptions {
            fail_fast: true,
            ..Default::default()
        };

        let summary =
            run_tree(temp.path(), &options, logger(), |_, _| ControlFlow::Continue(())).unwrap();

        assert!(summary.stopped);
        assert_eq!(summary.results, 0);
    }

    #[test]
    fn sink_can_stop_the_run() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "save.toml", "[general]\nexecCmd = \"true\"\n[warn]");
        write(temp.path(), "ATest.kt", "");
        write(temp.path(), "BTest.kt", "");

        let summary =
            run_tree(temp.path(), &RunOptions::default(), logger(), |_, _| ControlFlow::Break(()))
                .unwrap();

        assert!(summary.stopped);
        assert_eq!(summary.results, 1);
    }

    #[test]
    fn crashed_batches_are_counted() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "save.toml", "[general]\nexecCmd = \"sh -c 'exit 127' sh\"\n[warn]");
        write(temp.path(), "ATest.kt", "");

        let summary =
            run_tree(temp.path(), &RunOptions::default(), logger(), |_, _| ControlFlow::Continue(()))
                .unwrap();

        assert_eq!(summary.crashed, 1);
        assert!(!summary.is_success());
    }

    #[test]
    fn missing_root_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(run_tree(temp.path(), &RunOptions::default(), logger(), |_, _| {
            ControlFlow::Continue(())
        })
        .is_err());
    }
}
