//! Integration tests for the roomline binary.

use std::{fs, path::PathBuf, time::Duration};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const SCRIPT: &str = r#"
initial:
  - { id: "$1", type: event, sender: "@alice:example.org", content: { kind: m.text, body: "hello" } }
steps:
  - diff: { op: push_back, item: { id: "$2", type: event, sender: "@bob:example.org", content: { kind: m.text, body: "hey" } } }
  - diff: { op: push_back, item: { id: "$3", type: event, sender: "@bob:example.org", content: { kind: m.emote, body: "waves" } } }
  - diff: { op: set, index: 1, item: { id: "$2", type: event, sender: "@bob:example.org", content: { kind: m.text, body: "hey!" }, is_edited: true, reactions: [ { key: "👍", count: 2, senders: [] } ] } }
  - state: fully_loaded
"#;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_cli_help() {
    let mut cmd = cargo_bin_cmd!("roomline");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replay"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("completion"));
}

#[test]
fn test_replay_requires_script() {
    let mut cmd = cargo_bin_cmd!("roomline");
    cmd.arg("replay")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "the following required arguments were not provided",
        ))
        .stderr(predicate::str::contains("--script <SCRIPT>"));
}

#[test]
fn test_replay_prints_table() {
    let dir = TempDir::new().unwrap();
    let script = write(&dir, "session.yaml", SCRIPT);

    let mut cmd = cargo_bin_cmd!("roomline");
    cmd.arg("replay")
        .arg("--script")
        .arg(&script)
        .arg("--window-ms")
        .arg("50")
        .env_remove("RUST_LOG")
        .timeout(Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("flush 0 (1 items"))
        .stdout(predicate::str::contains("flush 1 (3 items"))
        .stdout(predicate::str::contains("[edited, 👍 x2]"))
        .stdout(predicate::str::contains("* waves"))
        .stdout(predicate::str::contains("final state: fully_loaded"));
}

#[test]
fn test_replay_json_lines() {
    let dir = TempDir::new().unwrap();
    let script = write(&dir, "session.yml", SCRIPT);

    let output = cargo_bin_cmd!("roomline")
        .arg("replay")
        .arg("--script")
        .arg(&script)
        .arg("--json")
        .timeout(Duration::from_secs(10))
        .output()
        .unwrap();
    assert!(output.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let last = lines.last().unwrap();
    let styles: Vec<&str> = last["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["group_style"].as_str().unwrap())
        .collect();
    assert_eq!(styles, ["single", "single", "single"]);
}

#[test]
fn test_replay_rejects_invalid_window() {
    let dir = TempDir::new().unwrap();
    let script = write(&dir, "session.yaml", SCRIPT);

    let mut cmd = cargo_bin_cmd!("roomline");
    cmd.arg("replay")
        .arg("--script")
        .arg(&script)
        .arg("--window-ms")
        .arg("120000")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn test_replay_reports_missing_script() {
    let dir = TempDir::new().unwrap();

    let mut cmd = cargo_bin_cmd!("roomline");
    cmd.arg("replay")
        .arg("--script")
        .arg(dir.path().join("missing.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read replay script"));
}

#[test]
fn test_config_writes_requested_format() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("roomline.toml");

    let mut cmd = cargo_bin_cmd!("roomline");
    cmd.arg("config")
        .arg("--format")
        .arg("toml")
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("generated successfully"));

    let written = fs::read_to_string(output).unwrap();
    assert!(written.contains("debounce_window_ms = 100"));
}

#[test]
fn test_config_to_stdout() {
    let mut cmd = cargo_bin_cmd!("roomline");
    cmd.args(["config", "--format", "json", "--output", "-"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"update_channel_capacity\": 64"));
}

#[test]
fn test_config_rejects_unknown_format() {
    let mut cmd = cargo_bin_cmd!("roomline");
    cmd.args(["config", "--format", "ini"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_completion_for_bash() {
    let mut cmd = cargo_bin_cmd!("roomline");
    cmd.args(["completion", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("roomline"));
}
