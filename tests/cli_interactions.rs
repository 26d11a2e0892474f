//! CLI flag handling via the real binary

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn exporter_cmd() -> Command {
    Command::cargo_bin("speedtest-exporter").unwrap()
}

#[test]
fn help_lists_all_flags() {
    exporter_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--test-interval"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--log-level"));
}

#[test]
fn version_flag_prints_version() {
    exporter_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn zero_interval_is_rejected_at_parse_time() {
    exporter_cmd()
        .args(["--test-interval", "0s"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("strictly positive"));
}

#[test]
fn malformed_interval_is_rejected() {
    exporter_cmd()
        .args(["--test-interval", "soon"])
        .assert()
        .failure();
}

#[test]
fn invalid_log_level_is_rejected() {
    exporter_cmd()
        .args(["--log-level", "shouting"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid log level"));
}

#[test]
fn unknown_flag_is_rejected() {
    exporter_cmd().arg("--no-such-flag").assert().failure();
}
