use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tracing::info;

#[test]
fn test_help_command() {
    m13_common::logging::ensure_test_logging(None);
    info!("Testing CLI help command");

    let mut cmd = Command::cargo_bin("m13").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("REST facade for live debugging sessions"));
}

#[test]
fn test_version_command() {
    m13_common::logging::ensure_test_logging(None);
    info!("Running test");
    let mut cmd = Command::cargo_bin("m13").unwrap();
    cmd.arg("--version").assert().success().stdout(predicate::str::contains("m13"));
}

#[test]
fn test_serve_subcommand_help() {
    m13_common::logging::ensure_test_logging(None);
    info!("Running test");
    let mut cmd = Command::cargo_bin("m13").unwrap();
    cmd.arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--advertise-url"))
        .stdout(predicate::str::contains("--port"));
}

#[test]
#[serial]
fn test_info_prints_version_document() {
    m13_common::logging::ensure_test_logging(None);
    info!("Running test");
    let mut cmd = Command::cargo_bin("m13").unwrap();
    cmd.arg("info").assert().success().stdout(predicate::str::contains("\"version\": \"m13-sandbox"));
}

#[test]
#[serial]
fn test_missing_config_file_fails() {
    m13_common::logging::ensure_test_logging(None);
    info!("Running test");
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("m13").unwrap();
    cmd.arg("serve")
        .arg("--port")
        .arg("0")
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn test_invalid_port() {
    m13_common::logging::ensure_test_logging(None);
    info!("Running test");
    let mut cmd = Command::cargo_bin("m13").unwrap();
    cmd.arg("serve").arg("--port").arg("70000").assert().failure();
}

#[test]
fn test_missing_subcommand() {
    m13_common::logging::ensure_test_logging(None);
    info!("Running test");
    let mut cmd = Command::cargo_bin("m13").unwrap();
    cmd.assert().failure().stderr(predicate::str::contains("Usage"));
}
