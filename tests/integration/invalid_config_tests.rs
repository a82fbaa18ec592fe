//! These tests are for testing some invalid config-file-specific options.

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::hws_command;

#[test]
fn test_toml_mismatch_type() {
    hws_command(&["-C", "./tests/invalid_configs/toml_mismatch_type.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid type"));
}

/// This test isn't really needed as this is already an error in TOML itself.
/// However, I feel like it's worth checking anyways - not like it takes long.
#[test]
fn test_duplicate_key() {
    hws_command(&["-C", "./tests/invalid_configs/duplicate_key.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate key"));
}

#[test]
fn test_small_interval() {
    hws_command(&["-C", "./tests/invalid_configs/small_interval.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'interval' must be at least 100ms."));
}

#[test]
fn test_invalid_interval() {
    hws_command(&["-C", "./tests/invalid_configs/invalid_interval.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "'interval' was set with an invalid value",
        ));
}

#[test]
fn test_invalid_section() {
    hws_command(&["-C", "./tests/invalid_configs/invalid_section.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'gpu' is not a valid section name."));
}

#[test]
fn test_empty_sections() {
    hws_command(&["-C", "./tests/invalid_configs/empty_sections.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must name at least one section"));
}

/// Arguments override the config file, so a valid argument hides a bad config value.
#[cfg(target_os = "linux")]
#[test]
fn test_args_override_config() {
    hws_command(&[
        "-C",
        "./tests/invalid_configs/invalid_section.toml",
        "-s",
        "usb",
    ])
    .assert()
    .success();
}
