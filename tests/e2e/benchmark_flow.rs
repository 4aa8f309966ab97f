//! E2E Benchmark Flow Tests
//!
//! Drives BenchmarkRunner through the real HTTP client.
//!
//! ## Test Coverage
//!
//! - One PUT and one DELETE per repetition
//! - Uploaded bodies have the planned size
//! - Service errors retried, then given up on
//! - Failed deletes do not stop the run

use super::common::E2ETestEnv;
use cos_speedtest::bench::{
    BenchmarkRunner, PayloadSize, Report, RetryPolicy, RunnerOptions, TestPlan,
};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn fast_retry(max_attempts: u32) -> RunnerOptions {
    RunnerOptions {
        retry: RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        },
        key_prefix: String::new(),
    }
}

/// Test: every repetition uploads then deletes its object
#[tokio::test]
async fn test_full_run_puts_and_deletes() {
    let env = E2ETestEnv::new().await;
    let client = env.client();

    let plan = TestPlan::new(
        vec![PayloadSize::new(1024).unwrap(), PayloadSize::new(4096).unwrap()],
        3,
    )
    .unwrap();
    let runner = BenchmarkRunner::new(&client, plan, RunnerOptions::default());
    let mut report = Report::new(Vec::new());
    let summaries = runner.run(&mut report).await.unwrap();
    let output = String::from_utf8(report.into_inner()).unwrap();

    assert_eq!(env.count_requests("PUT").await, 6);
    assert_eq!(env.count_requests("DELETE").await, 6);
    assert_eq!(output.matches("requestId: e2e-put, httpCode: 200 OK").count(), 6);
    assert_eq!(output.matches("average speed").count(), 2);
    assert!(summaries.iter().all(|s| s.successes == 3 && !s.abandoned));
}

/// Test: bodies carry the planned number of bytes under the planned keys
#[tokio::test]
async fn test_uploaded_bodies_match_plan() {
    let env = E2ETestEnv::new().await;
    let client = env.client();

    let plan = TestPlan::new(vec![PayloadSize::new(2048).unwrap()], 2).unwrap();
    let runner = BenchmarkRunner::new(&client, plan, RunnerOptions::default());
    runner.run(&mut Report::new(Vec::new())).await.unwrap();

    let requests = env.server.received_requests().await.unwrap();
    let puts: Vec<_> = requests
        .iter()
        .filter(|r| r.method.as_str() == "PUT")
        .collect();

    assert_eq!(puts.len(), 2);
    assert_eq!(puts[0].url.path(), "/testfile2KB-0");
    assert_eq!(puts[1].url.path(), "/testfile2KB-1");
    for put in puts {
        assert_eq!(put.body.len(), 2048);
        assert!(put.body.iter().all(|b| *b == b't'));
    }
}

/// Test: an access-denied bucket exhausts the retry budget for every size
#[tokio::test]
async fn test_access_denied_gives_up() {
    let env = E2ETestEnv::empty().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string(
            "<Error><Code>AccessDenied</Code><Message>Access Denied.</Message>\
             <Resource>examplebucket-1250000000/testfile1KB-0</Resource>\
             <RequestId>denied-req</RequestId></Error>",
        ))
        .mount(&env.server)
        .await;
    let client = env.client();

    let plan = TestPlan::new(
        vec![PayloadSize::new(1024).unwrap(), PayloadSize::new(2048).unwrap()],
        2,
    )
    .unwrap();
    let runner = BenchmarkRunner::new(&client, plan, fast_retry(2));
    let mut report = Report::new(Vec::new());
    let summaries = runner.run(&mut report).await.unwrap();
    let output = String::from_utf8(report.into_inner()).unwrap();

    assert_eq!(env.count_requests("PUT").await, 4);
    assert_eq!(env.count_requests("DELETE").await, 0);
    assert!(output.contains("ERROR: Code: AccessDenied"));
    assert!(output.contains("ERROR: RequestId: denied-req"));
    assert!(output.contains("no successful trials for 1KB"));
    assert!(output.contains("no successful trials for 2KB"));
    assert!(summaries.iter().all(|s| s.abandoned));
}

/// Test: a transient failure is retried at the same key
#[tokio::test]
async fn test_transient_failure_retried() {
    let env = E2ETestEnv::empty().await;
    Mock::given(method("PUT"))
        .and(path("/testfile1KB-0"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&env.server)
        .await;
    env.accept_all().await;
    let client = env.client();

    let plan = TestPlan::new(vec![PayloadSize::new(1024).unwrap()], 1).unwrap();
    let runner = BenchmarkRunner::new(&client, plan, fast_retry(3));
    let mut report = Report::new(Vec::new());
    let summaries = runner.run(&mut report).await.unwrap();
    let output = String::from_utf8(report.into_inner()).unwrap();

    assert_eq!(env.count_requests("PUT").await, 2);
    assert!(output.contains("upload failed testfile1KB-0"));
    assert!(output.contains("succeed to upload testfile1KB-0"));
    assert_eq!(summaries[0].successes, 1);
}

/// Test: cleanup failures are reported and the run continues
#[tokio::test]
async fn test_delete_failure_continues() {
    let env = E2ETestEnv::empty().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&env.server)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&env.server)
        .await;
    let client = env.client();

    let plan = TestPlan::new(vec![PayloadSize::new(1024).unwrap()], 3).unwrap();
    let runner = BenchmarkRunner::new(&client, plan, RunnerOptions::default());
    let mut report = Report::new(Vec::new());
    let summaries = runner.run(&mut report).await.unwrap();
    let output = String::from_utf8(report.into_inner()).unwrap();

    assert_eq!(output.matches("failed to delete").count(), 3);
    assert_eq!(output.matches("WARN: Resource is not existed").count(), 3);
    assert_eq!(summaries[0].successes, 3);
}
