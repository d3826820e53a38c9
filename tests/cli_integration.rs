//! Integration tests for the command-line front end.
//!
//! These exercise argument handling and window resolution; formatting itself
//! is covered against an in-memory window in run_scenarios.rs.

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn acme_fmt() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_acme-fmt"));
    cmd.env_remove("winid")
        .env_remove("ACMEFMT_MOUNT")
        .env_remove("ACMEFMT_CONFIG")
        .env("HOME", env!("CARGO_TARGET_TMPDIR"));
    cmd
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_help() {
    let output = acme_fmt().arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Reformat an acme window"));
}

#[test]
fn test_no_command_is_usage_error() {
    let output = acme_fmt().output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Usage"));
}

#[test]
fn test_missing_winid() {
    let output = acme_fmt().arg("gofmt").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed to open win"));
}

#[test]
fn test_bad_winid() {
    let output = acme_fmt().env("winid", "nope").arg("gofmt").output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("failed to open win"));
    assert!(err.contains("invalid window id"));
}

#[test]
fn test_window_not_found() {
    let mount = TempDir::new().unwrap();

    let output = acme_fmt()
        .env("winid", "12")
        .arg("--mount")
        .arg(mount.path())
        .arg("gofmt")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("failed to open win"));
}

#[test]
fn test_invalid_settings_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "[tempfile]\nprefix = \"a/b\"\n").unwrap();

    let output = acme_fmt()
        .env("winid", "1")
        .arg("--config")
        .arg(&config)
        .arg("gofmt")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("invalid settings"));
}

#[test]
fn test_formatter_arguments_pass_through() {
    // Flags after the command belong to the command, not to acme-fmt.
    let output = acme_fmt()
        .args(["gofmt", "-n", "--diff"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("$winid is not set"));
}
