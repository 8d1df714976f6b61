//! Integration tests for CLI commands

#![allow(deprecated)]

use assert_cmd::{assert::OutputAssertExt, cargo::CommandCargoExt};
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("geochat").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("tools"));
}

#[test]
fn test_serve_help_shows_options() {
    let mut cmd = Command::cargo_bin("geochat").unwrap();
    cmd.arg("serve").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--host"));
}

#[test]
fn test_invalid_config_file_fails() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(&path, "[llm\nmodel = ").unwrap();

    let mut cmd = Command::cargo_bin("geochat").unwrap();
    cmd.arg("--config").arg(&path).arg("tools");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn test_chat_exits_on_bye() {
    let tmp = TempDir::new().unwrap();

    let mut cmd = assert_cmd::Command::cargo_bin("geochat").unwrap();
    cmd.arg("--config")
        .arg(tmp.path().join("missing.toml"))
        .arg("chat")
        .write_stdin("\nbye\n");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Please enter a query."))
        .stdout(predicate::str::contains("Goodbye!"));
}

#[test]
fn test_tools_reports_missing_server_script() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[mcp.servers.local]
command = "python3"
args = ["/definitely/not/here/server.py"]
"#,
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("geochat").unwrap();
    cmd.arg("--config").arg(&path).arg("tools");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Required paths are missing"));
}
