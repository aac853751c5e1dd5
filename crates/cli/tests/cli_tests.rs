//! CLI integration tests

use std::process::Command;

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "irp-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = run_cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Incident Risk Predictor"),
        "Should show app name"
    );
    for command in ["ingest", "etl", "train", "predict", "alerts", "backtest", "summary", "model", "reset"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = run_cli(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("irp"), "Should show binary name");
}

/// Test train subcommand help lists its parameters
#[test]
fn test_train_help() {
    let output = run_cli(&["train", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Train help should succeed");
    assert!(stdout.contains("--horizon-hours"), "Should show horizon option");
    assert!(stdout.contains("--incident-threshold"), "Should show threshold option");
    assert!(stdout.contains("--learning-rate"), "Should show learning rate option");
    assert!(stdout.contains("--epochs"), "Should show epochs option");
}

/// Test predict subcommand help
#[test]
fn test_predict_help() {
    let output = run_cli(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    assert!(stdout.contains("live"), "Should show live subcommand");
    assert!(stdout.contains("batch"), "Should show batch subcommand");
}

/// Test backtest subcommand help
#[test]
fn test_backtest_help() {
    let output = run_cli(&["backtest", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Backtest help should succeed");
    assert!(stdout.contains("--top-k"), "Should show top-k option");
}

/// Test that an invalid format is rejected
#[test]
fn test_invalid_format() {
    let output = run_cli(&["--format", "xml", "summary"]);
    assert!(!output.status.success(), "Invalid format should fail");
}

/// Test that a missing subcommand is rejected
#[test]
fn test_missing_subcommand() {
    let output = run_cli(&[]);
    assert!(!output.status.success(), "Missing subcommand should fail");
}

/// Test that an unreachable API produces an error instead of a panic
#[test]
fn test_unreachable_api() {
    let output = run_cli(&["--api-url", "http://127.0.0.1:9", "summary"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Unreachable API should fail");
    assert!(stderr.contains("Failed to send request"), "Should report the request failure");
}

/// Test that a missing ingest file is reported
#[test]
fn test_ingest_missing_file() {
    let output = run_cli(&["--api-url", "http://127.0.0.1:9", "ingest", "/nonexistent/events.json"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Missing file should fail");
    assert!(stderr.contains("Failed to read"), "Should report the unreadable file");
}
