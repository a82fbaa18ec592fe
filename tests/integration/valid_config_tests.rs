//! Tests config files that should be accepted.
//!
//! These read real hardware, so they only run where hws has a backend.

#![cfg(any(
    target_os = "linux",
    target_os = "windows",
    target_os = "macos",
    target_os = "freebsd"
))]

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::{hws_command, no_cfg_hws_command};

#[test]
fn test_empty_config() {
    no_cfg_hws_command()
        .args(["-s", "memory"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Platform: "))
        .stdout(predicate::str::contains("\nMemory\n"));
}

#[test]
fn test_all_flags() {
    let output = hws_command(&["-C", "./tests/valid_configs/all_flags.toml"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(json.get("usb").is_some() || json.get("errors").is_some());
    assert!(json.get("memory").is_some() || json.get("errors").is_some());
    assert!(json.get("processor").is_none());
}

#[test]
fn test_numeric_interval() {
    hws_command(&["-C", "./tests/valid_configs/numeric_interval.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("over 200ms"));
}

#[test]
fn test_creates_missing_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("hwscope.toml");

    hws_command(&["-C", path.to_str().unwrap(), "-s", "memory"])
        .assert()
        .success();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("[flags]"));
    assert!(written.contains("#interval"));
}
