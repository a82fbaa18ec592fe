//! These tests are mostly here just to ensure that invalid results will be
//! caught when passing arguments.

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::no_cfg_hws_command;

#[test]
fn test_small_interval() {
    no_cfg_hws_command()
        .arg("-i")
        .arg("99")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'--interval' must be at least 100ms.",
        ));
}

#[test]
fn test_invalid_interval() {
    no_cfg_hws_command()
        .arg("--interval")
        .arg("soon")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'--interval' was set with an invalid value",
        ));
}

#[test]
fn test_invalid_section() {
    no_cfg_hws_command()
        .arg("-s")
        .arg("gpu")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'gpu'"));
}

#[test]
fn test_help() {
    no_cfg_hws_command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("General Options"))
        .stdout(predicate::str::contains("Output Options"));
}

#[test]
fn test_version() {
    no_cfg_hws_command()
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("hws "));
}

#[cfg(target_os = "linux")]
#[test]
fn test_usb_tree_section() {
    no_cfg_hws_command()
        .args(["-s", "usb", "--usb_tree"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Platform: Linux"))
        .stdout(predicate::str::contains("\nUSB\n"))
        .stdout(predicate::str::contains("Processor").not());
}

#[cfg(any(
    target_os = "linux",
    target_os = "windows",
    target_os = "macos",
    target_os = "freebsd"
))]
#[test]
fn test_json_output() {
    let output = no_cfg_hws_command()
        .args(["--json", "-s", "processor", "-i", "100"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let load = json["processor"]["load"].as_f64().unwrap();

    assert!((0.0..=100.0).contains(&load));
    assert_eq!(json["processor"]["load_interval_ms"], 100);
    assert!(json["processor"]["ticks"].as_array().unwrap().len() == 4);
    assert!(json.get("usb").is_none());
}
