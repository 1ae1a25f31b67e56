//! Integration tests for the config tree public API.

use save::config::{
    load_plugin_configs, ConfigSection, ConfigTree, PluginConfig, CONFIG_FILE_NAME,
};
use save::logging::{LogLevel, MemoryLogger};
use save::SaveError;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write_config(dir: &Path, relative: &str, content: &str) {
    let dir = dir.join(relative);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(CONFIG_FILE_NAME), content).unwrap();
}

fn discover(root: &Path) -> (ConfigTree, Arc<MemoryLogger>) {
    let logger = Arc::new(MemoryLogger::new());
    let tree = ConfigTree::discover(root, CONFIG_FILE_NAME, logger.clone()).unwrap();
    (tree, logger)
}

#[test]
fn three_level_tree_inherits_from_every_ancestor() {
    let temp = TempDir::new().unwrap();
    write_config(
        temp.path(),
        "",
        "[general]\nexecCmd = \"ktlint\"\ntimeOutMillis = 500\n[warn]\nbatchSize = 3",
    );
    write_config(temp.path(), "rules", "[warn]\nexecFlags = \"--relative\"");
    write_config(
        temp.path(),
        "rules/imports",
        "[general]\nsuiteName = \"imports\"\n[warn]\nbatchSize = 1",
    );

    let (mut tree, _) = discover(temp.path());
    let resolution = tree.resolve_all(|node| load_plugin_configs(node.location()));
    assert!(resolution.failed.is_empty());

    let root = tree.root().unwrap();
    let leaf = *tree.all_descendants(root).last().unwrap();
    let node = tree.node(leaf);

    let general = node.general_config().unwrap();
    assert_eq!(general.exec_cmd.as_deref(), Some("ktlint"));
    assert_eq!(general.time_out_millis, Some(500));
    assert_eq!(general.suite_name.as_deref(), Some("imports"));

    let warn = node
        .plugin_configs()
        .iter()
        .find_map(|c| match c {
            PluginConfig::Warn(w) => Some(w),
            _ => None,
        })
        .unwrap();
    assert_eq!(warn.batch_size, Some(1));
    assert_eq!(warn.exec_flags.as_deref(), Some("--relative"));
    assert_eq!(warn.config_location, temp.path().join("rules/imports/save.toml"));
}

#[test]
fn invalid_sibling_does_not_affect_the_other_sibling() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "", "[fix]\nbatchSize = 2");
    write_config(
        temp.path(),
        "broken",
        "[fix]\nresourceNameTest = \"Same\"\nresourceNameExpected = \"Same\"",
    );
    write_config(temp.path(), "broken/deeper", "[fix]");
    write_config(temp.path(), "fine", "[fix]");

    let (mut tree, logger) = discover(temp.path());
    let resolution = tree.resolve_all(|node| load_plugin_configs(node.location()));

    assert_eq!(resolution.failed.len(), 1);
    assert!(matches!(
        resolution.failed[0].1,
        SaveError::ConfigValidation {
            section: ConfigSection::Fix,
            ..
        }
    ));
    assert_eq!(resolution.skipped.len(), 1);

    let fine = tree
        .all_descendants(tree.root().unwrap())
        .into_iter()
        .find(|id| tree.node(*id).directory() == temp.path().join("fine"))
        .unwrap();
    assert!(resolution.is_resolved(fine));
    assert!(!logger.at_level(LogLevel::Warn).is_empty());
}

#[test]
fn unknown_section_fails_parsing() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "", "[lint]\nfoo = 1");

    let (mut tree, _) = discover(temp.path());
    let resolution = tree.resolve_all(|node| load_plugin_configs(node.location()));

    assert!(matches!(
        resolution.failed[0].1,
        SaveError::ConfigParse { .. }
    ));
}

#[test]
fn fix_and_warn_requires_consistent_nested_sections() {
    let temp = TempDir::new().unwrap();
    write_config(
        temp.path(),
        "",
        r#"
["fix and warn".fix]
resourceNameTest = "Test"
batchSize = 2
["fix and warn".warn]
batchSize = 3
"#,
    );

    let (mut tree, _) = discover(temp.path());
    let resolution = tree.resolve_all(|node| load_plugin_configs(node.location()));

    let message = resolution.failed[0].1.to_string();
    assert!(message.contains("[fix]: {Test, 2}, [warn]: {.*Test.*, 3}"));
}

#[test]
fn root_without_config_is_rejected() {
    let temp = TempDir::new().unwrap();
    let err = ConfigTree::discover(temp.path(), CONFIG_FILE_NAME, Arc::new(MemoryLogger::new()))
        .unwrap_err();
    assert!(matches!(err, SaveError::ConfigStructure { .. }));
}
