//! E2E CLI Tests
//!
//! Runs the compiled `cos-speedtest` binary.
//!
//! ## Test Coverage
//!
//! - Missing configuration file fails before any network activity
//! - Invalid command-line plans are rejected
//! - A full run against the mock endpoint keeps stdout to report lines
//! - `--pause` consumes a line of stdin before exiting

use super::common::{E2ETestEnv, TEST_BUCKET, TEST_REGION};
use assert_cmd::Command;
use predicates::prelude::*;

fn speedtest() -> Command {
    let mut cmd = Command::cargo_bin("cos-speedtest").expect("Failed to find cos-speedtest");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Test: a missing config file exits non-zero without printing a report
#[test]
fn test_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();

    let output = speedtest()
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .output()
        .expect("Failed to run cos-speedtest");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    // One diagnostic line, each cause listed once
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.lines().count(), 1, "stderr: {}", stderr);
    assert!(stderr.starts_with("Error: Failed to load configuration"));
    assert!(stderr.contains("Failed to read config file"));
    assert_eq!(stderr.matches("os error").count(), 1, "stderr: {}", stderr);
}

/// Test: a config file missing a required field is rejected
#[test]
fn test_incomplete_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"SecretID": "id", "SecretKey": "key"}"#).unwrap();

    speedtest()
        .arg("-c")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Region"));
}

/// Test: zero-byte sizes are rejected
#[test]
fn test_invalid_sizes_rejected() {
    speedtest()
        .args(["--sizes", "0MB"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid --sizes"));
}

/// Test: sizes beyond a single upload are rejected before any request
#[test]
fn test_oversized_payload_rejected() {
    speedtest()
        .args(["--sizes", "18446744073709551615", "-n", "1"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Invalid --sizes"))
        .stderr(predicate::str::contains("panicked").not());
}

/// Test: zero repetitions are rejected
#[test]
fn test_zero_repetitions_rejected() {
    speedtest()
        .args(["-n", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid test plan"));
}

/// Test: a full run prints the banner, headers, trial lines and averages
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_full_run_against_mock_endpoint() {
    let env = E2ETestEnv::new().await;
    let config_path = env.write_config_file();

    let output = tokio::task::spawn_blocking(move || {
        speedtest()
            .arg("--config")
            .arg(&config_path)
            .args(["--sizes", "1KB,2KB", "-n", "2"])
            .output()
            .expect("Failed to run cos-speedtest")
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(
        lines[0],
        format!("Region:{}, Bucket:{}", TEST_REGION, TEST_BUCKET)
    );
    assert_eq!(lines[1], "============test upload 1KB file===============");
    assert!(lines[2].starts_with("succeed to upload testfile1KB-0, requestId: e2e-put, httpCode: 200 OK"));
    assert!(lines[3].starts_with("succeed to upload testfile1KB-1,"));
    assert_eq!(lines[4], "");
    assert!(lines[5].starts_with("average speed "));
    assert_eq!(lines[6], "============test upload 2KB file===============");
    assert_eq!(stdout.matches("succeed to upload").count(), 4);

    assert_eq!(env.count_requests("PUT").await, 4);
    assert_eq!(env.count_requests("DELETE").await, 4);
}

/// Test: metrics are appended after the report when requested
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_print_metrics() {
    let env = E2ETestEnv::new().await;
    let config_path = env.write_config_file();

    let output = tokio::task::spawn_blocking(move || {
        speedtest()
            .arg("--config")
            .arg(&config_path)
            .args(["--sizes", "1KB", "-n", "1", "--print-metrics"])
            .output()
            .expect("Failed to run cos-speedtest")
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("cos_speedtest_trials_total{size=\"1KB\",status=\"success\"} 1"));
    assert!(stdout.contains("cos_speedtest_upload_bytes_total 1024"));
}

/// Test: --pause waits for a line on stdin before exiting
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pause_reads_stdin_before_exit() {
    let env = E2ETestEnv::new().await;
    let config_path = env.write_config_file();

    let output = tokio::task::spawn_blocking(move || {
        speedtest()
            .arg("--config")
            .arg(&config_path)
            .args(["--sizes", "1KB", "-n", "1", "--pause"])
            .write_stdin("\n")
            .timeout(std::time::Duration::from_secs(30))
            .output()
            .expect("Failed to run cos-speedtest")
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let last = stdout.lines().last().unwrap();
    assert_eq!(last, "Press Enter to exit...");
    assert!(stdout.contains("average speed"));
}
