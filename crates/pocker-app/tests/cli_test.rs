//! End-to-end runs of the launcher binary.

use serde_json::json;
use std::process::Command;
use test_support::write_settings;

fn app_command() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_pocker-app"));
    command
        .env_remove("PLANNING_POCKER_CONFIG")
        .env_remove("LOG_LEVEL")
        .env_remove("RUST_LOG");
    command
}

#[test]
fn test_generate_prints_settings_schema() {
    let output = app_command().arg("generate").output().unwrap();
    assert!(output.status.success());

    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rendered = schema.to_string();
    assert!(rendered.contains("healthcheck"));
    assert!(rendered.contains("with_trace_id"));
}

#[test]
fn test_check_reports_ok() {
    let file = write_settings(&json!({"service": "lobby", "log": {"level": "warn"}}));
    let output = app_command()
        .args(["check", "--config"])
        .arg(file.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "ok");
}

#[test]
fn test_check_fails_on_missing_settings_file() {
    let output = app_command()
        .args(["check", "--config", "/definitely/not/here.json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to resolve settings"));
    assert!(stderr.contains("Settings file not found"));
}
