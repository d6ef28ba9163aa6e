use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

fn valid_settings_json() -> &'static str {
    r#"
{
  "version": 1,
  "tick_interval_ms": 10,
  "finish_hold_ms": 3000,
  "alert_enabled": true
}
"#
}

#[test]
fn diagnostics_succeeds_with_valid_settings_file() {
    let dir = tempdir().expect("tempdir");
    let settings = dir.path().join("settings.json");
    fs::write(&settings, valid_settings_json()).expect("write json");

    let mut cmd = cargo_bin_cmd!("stopclock");
    cmd.arg("--diagnostics")
        .arg("--settings")
        .arg(settings)
        .assert()
        .success()
        .stdout(predicate::str::contains("Tick interval: 10 ms"))
        .stdout(predicate::str::contains("Benchmark summary"));
}

#[test]
fn diagnostics_succeeds_without_a_settings_file() {
    let dir = tempdir().expect("tempdir");
    let settings = dir.path().join("absent.json");

    let mut cmd = cargo_bin_cmd!("stopclock");
    cmd.arg("--diagnostics")
        .arg("--settings")
        .arg(settings)
        .assert()
        .success()
        .stdout(predicate::str::contains("Tick interval: 10 ms"));
}

#[test]
fn malformed_settings_fail_with_clear_error() {
    let dir = tempdir().expect("tempdir");
    let settings = dir.path().join("settings.json");
    fs::write(&settings, "{ not-valid-json ").expect("write invalid json");

    let mut cmd = cargo_bin_cmd!("stopclock");
    cmd.arg("--diagnostics")
        .arg("--settings")
        .arg(settings)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON"));
}

#[test]
fn zero_tick_interval_in_settings_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let settings = dir.path().join("settings.json");
    fs::write(&settings, r#"{ "version": 1, "tick_interval_ms": 0 }"#).expect("write json");

    let mut cmd = cargo_bin_cmd!("stopclock");
    cmd.arg("--diagnostics")
        .arg("--settings")
        .arg(settings)
        .assert()
        .failure()
        .stderr(predicate::str::contains("tick_interval_ms"));
}

#[test]
fn zero_tick_interval_override_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let settings = dir.path().join("absent.json");

    let mut cmd = cargo_bin_cmd!("stopclock");
    cmd.arg("--diagnostics")
        .arg("--tick-interval-ms")
        .arg("0")
        .arg("--settings")
        .arg(settings)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--tick-interval-ms"));
}

#[test]
fn tick_interval_override_applies_to_diagnostics() {
    let dir = tempdir().expect("tempdir");
    let settings = dir.path().join("absent.json");

    let mut cmd = cargo_bin_cmd!("stopclock");
    cmd.arg("--diagnostics")
        .arg("--tick-interval-ms")
        .arg("25")
        .arg("--settings")
        .arg(settings)
        .assert()
        .success()
        .stdout(predicate::str::contains("Tick interval: 25 ms"));
}
