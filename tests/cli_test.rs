//! Integration tests for the `save` binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup_suite(config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("save.toml"), config).unwrap();
    temp
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("save"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--fail-fast"))
        .stdout(predicate::str::contains("--config-name"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("save"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_requires_test_root() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("save"));
    cmd.assert().failure();
    Ok(())
}

#[test]
fn cli_missing_root_config_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let mut cmd = Command::new(cargo_bin("save"));
    cmd.arg(temp.path());
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("save.toml"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn cli_runs_a_warn_suite() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_suite(
        r#"
[general]
execCmd = "echo FooTest.kt:3:1: unused import; true"
[warn]
"#,
    );
    fs::write(temp.path().join("FooTest.kt"), "import a.b")?;

    let mut cmd = Command::new(cargo_bin("save"));
    cmd.arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("FooTest.kt:3:1: unused import"))
        .stdout(predicate::str::contains("1 suite(s), 1 batch(es), 0 crashed"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn cli_accepts_a_test_root_relative_to_the_working_directory(
) -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let suite = temp.path().join("suite");
    fs::create_dir_all(suite.join("nested"))?;
    fs::write(
        suite.join("save.toml"),
        r#"
[general]
execCmd = "sh -c 'for f; do test -f \"$f\" && echo \"$(basename \"$f\"):3:1: unused import\"; done' sh"
[warn]
"#,
    )?;
    fs::write(suite.join("FooTest.kt"), "import a.b")?;
    fs::write(suite.join("nested/save.toml"), "[warn]")?;
    fs::write(suite.join("nested/BarTest.kt"), "import c.d")?;

    let mut cmd = Command::new(cargo_bin("save"));
    cmd.current_dir(temp.path()).arg("suite");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[.] FooTest.kt: exit code 0, 1 warning(s)"))
        .stdout(predicate::str::contains("    FooTest.kt:3:1: unused import"))
        .stdout(predicate::str::contains("[nested] BarTest.kt: exit code 0, 1 warning(s)"))
        .stdout(predicate::str::contains("    BarTest.kt:3:1: unused import"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn cli_reports_crashed_batches() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_suite("[general]\nexecCmd = \"definitely-not-a-real-tool-xyz\"\n[warn]");
    fs::write(temp.path().join("FooTest.kt"), "")?;

    let mut cmd = Command::new(cargo_bin("save"));
    cmd.arg(temp.path());
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("crashed"));
    Ok(())
}

#[test]
fn cli_reports_invalid_config() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_suite("[fix]\nresourceNameTest = \"Same\"\nresourceNameExpected = \"Same\"");

    let mut cmd = Command::new(cargo_bin("save"));
    cmd.arg(temp.path());
    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Invalid config"));
    Ok(())
}

#[test]
fn cli_honors_config_name() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("suite.toml"), "[general]\nexecCmd = \"true\"")?;

    let mut cmd = Command::new(cargo_bin("save"));
    cmd.arg("--config-name").arg("suite.toml").arg(temp.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("0 suite(s)"));
    Ok(())
}
