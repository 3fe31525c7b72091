//! CLI integration tests
//!
//! Tests the rexec CLI using assert_cmd. None of them need an SSH server.

use assert_cmd::Command;
use predicates::prelude::*;

fn rexec() -> Command {
    let mut cmd = Command::cargo_bin("rexec")
        .expect("Failed to locate rexec binary - ensure it's built before running tests");
    cmd.env_remove("REXEC_PASSWORD").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    rexec()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rexec"))
        .stdout(predicate::str::contains("remote device"));
}

#[test]
fn test_cli_version() {
    rexec()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rexec"));
}

#[test]
fn test_cli_exec_help() {
    rexec()
        .args(["exec", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--save"))
        .stdout(predicate::str::contains("--password"));
}

#[test]
fn test_cli_exec_requires_a_command() {
    rexec().args(["exec", "192.168.0.19"]).assert().failure();
}

#[test]
fn test_cli_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let path_arg = path.to_str().unwrap();

    rexec()
        .args(["--config", path_arg, "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));
    assert!(path.exists());

    rexec()
        .args(["--config", path_arg, "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("port = 22"))
        .stdout(predicate::str::contains("connect_timeout = 10"));
}

#[test]
fn test_cli_config_init_keeps_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "host = \"keep-me\"\n").unwrap();

    rexec()
        .args(["--config", path.to_str().unwrap(), "config", "init"])
        .assert()
        .success()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "host = \"keep-me\"\n");
}

#[test]
fn test_cli_config_show_hides_password() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "host = \"router\"\npassword = \"hunter2\"\n").unwrap();

    rexec()
        .args(["--config", path.to_str().unwrap(), "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("host = \"router\""))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_cli_config_path() {
    rexec()
        .args(["--config", "/tmp/custom-rexec.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/custom-rexec.toml"));
}

#[test]
fn test_cli_exec_without_password_fails_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "username = \"pi\"\n").unwrap();

    rexec()
        .args([
            "--config",
            path.to_str().unwrap(),
            "exec",
            "192.0.2.1",
            "uptime",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No password provided"));
}

#[test]
fn test_cli_exec_with_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    rexec()
        .args(["--config", path.to_str().unwrap(), "exec", "router", "uptime"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}
