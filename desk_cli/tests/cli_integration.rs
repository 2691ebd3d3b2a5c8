//! End-to-end CLI tests against the simulated desk.

use assert_cmd::Command;
use predicates::prelude::*;
use rstest::rstest;
use std::io::Write;

fn desk_cmd() -> Command {
    Command::cargo_bin("desk_cli").expect("binary built")
}

fn write_temp_config() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp config");
    let toml = r#"
        [desk]
        standing_height_in = 40.0
        sitting_height_in = 25.0

        [control]
        landing_offset_cm = 0.5
        min_command_interval_ms = 200
        min_travel_cm = 0.5

        [timeouts]
        telemetry_ms = 100

        [logging]
        level = "warn"
    "#;
    file.write_all(toml.as_bytes()).expect("write temp config");
    file
}

#[test]
fn no_arguments_prints_help() {
    desk_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:").and(predicate::str::contains("desk")));
}

#[test]
fn help_lists_subcommands() {
    desk_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("move")
                .and(predicate::str::contains("watch"))
                .and(predicate::str::contains("self-check")),
        );
}

#[rstest]
#[case(false)]
#[case(true)]
fn self_check_passes_on_the_simulated_desk(#[case] json: bool) {
    let cfg = write_temp_config();

    let mut cmd = desk_cmd();
    cmd.arg("--config").arg(cfg.path());
    if json {
        cmd.arg("--json");
    }
    cmd.arg("self-check");

    let assert = cmd.timeout(std::time::Duration::from_secs(60)).assert();
    let output = assert.success().get_output().clone();
    let stdout = String::from_utf8_lossy(&output.stdout);

    if json {
        let line = stdout.lines().last().expect("json line");
        let value: serde_json::Value = serde_json::from_str(line).expect("valid json");
        assert_eq!(value["ok"], serde_json::Value::Bool(true));
        assert_eq!(value["status"], "Arrived");
        assert!(value["commands"].as_u64().expect("commands") >= 2);
    } else {
        assert!(stdout.contains("self-check ok"), "stdout: {stdout}");
    }
}

#[test]
fn move_requires_a_target() {
    let cfg = write_temp_config();
    desk_cmd()
        .arg("--config")
        .arg(cfg.path())
        .arg("move")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--to"));
}

#[test]
fn invalid_config_is_reported() {
    let mut file = tempfile::NamedTempFile::new().expect("temp config");
    file.write_all(b"[autostand]\nstand_minute = 99\n")
        .expect("write");

    desk_cmd()
        .arg("--config")
        .arg(file.path())
        .arg("self-check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stand_minute"));
}
