//! Benchmark runner
//!
//! Executes the test plan one trial at a time: upload, time, delete. A Put
//! is fully awaited before its timer stops, and the paired Delete is awaited
//! before the next trial starts, so the figures describe single-stream
//! throughput.
//!
//! # Example
//!
//! ```no_run
//! use cos_speedtest::bench::{BenchmarkRunner, Report, RunnerOptions, TestPlan};
//! use cos_speedtest::config::Config;
//! use cos_speedtest::cos::CosClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("config.json")?;
//! let client = CosClient::from_config(&config, None)?;
//! let runner = BenchmarkRunner::new(&client, TestPlan::default(), RunnerOptions::default());
//!
//! let mut report = Report::new(std::io::stdout());
//! let summaries = runner.run(&mut report).await?;
//! println!("{} sizes measured", summaries.len());
//! # Ok(())
//! # }
//! ```

use super::report::Report;
use super::{
    generate_payload, object_key, PayloadSize, PlanError, SizeAggregate, SizeSummary, TestPlan,
    TrialOutcome, TrialResult,
};
use crate::cos::{ObjectStore, StorageError};
use crate::metrics;
use bytes::Bytes;
use std::io::Write;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Benchmark errors
///
/// Storage failures never surface here; they are reported and retried.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Failed to write report")]
    Report(#[from] std::io::Error),

    #[error("Cannot generate payload")]
    Payload(#[from] PlanError),
}

/// Bounded retry for failed uploads of the same trial index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failed attempts allowed per trial; 0 retries forever
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Retry forever, the way a plain re-entry loop behaves
    pub fn unbounded() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }

    /// Whether another attempt may follow `failed_attempts` consecutive failures
    pub fn allows_retry(&self, failed_attempts: u32) -> bool {
        self.max_attempts == 0 || failed_attempts < self.max_attempts
    }

    /// Delay before the attempt following failure number `failed_attempts` (1-based)
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Runner options beyond the test plan
#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    pub retry: RetryPolicy,
    /// Prepended to every object key
    pub key_prefix: String,
}

/// Executes a [`TestPlan`] against an [`ObjectStore`]
pub struct BenchmarkRunner<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    plan: TestPlan,
    options: RunnerOptions,
}

impl<'a, S: ObjectStore + ?Sized> BenchmarkRunner<'a, S> {
    pub fn new(store: &'a S, plan: TestPlan, options: RunnerOptions) -> Self {
        Self {
            store,
            plan,
            options,
        }
    }

    /// Run every size of the plan in order
    ///
    /// Returns one summary per size. Only a failure to write the report ends
    /// the run early.
    pub async fn run<W: Write>(
        &self,
        report: &mut Report<W>,
    ) -> Result<Vec<SizeSummary>, BenchError> {
        let mut summaries = Vec::with_capacity(self.plan.sizes().len());
        let mut aggregate = SizeAggregate::default();

        for &size in self.plan.sizes() {
            let summary = self.run_size(size, &mut aggregate, report).await?;
            tracing::info!(
                size = %size,
                successes = summary.successes,
                total_elapsed_ms = summary.total_elapsed_ms,
                average_speed = summary.average_speed,
                abandoned = summary.abandoned,
                "Size completed"
            );
            summaries.push(summary);
            aggregate.reset();
        }

        Ok(summaries)
    }

    #[tracing::instrument(
        name = "bench.size",
        skip(self, aggregate, report),
        fields(size = %size, repetitions = self.plan.repetitions())
    )]
    async fn run_size<W: Write>(
        &self,
        size: PayloadSize,
        aggregate: &mut SizeAggregate,
        report: &mut Report<W>,
    ) -> Result<SizeSummary, BenchError> {
        let payload = generate_payload(size)?;
        report.size_header(size)?;

        let mut index = 0;
        let mut abandoned = false;

        'trials: while index < self.plan.repetitions() {
            let key = object_key(&self.options.key_prefix, size, index);
            let mut attempt = 0;

            loop {
                attempt += 1;
                let trial = self.run_trial(size, &key, attempt, payload.clone()).await;

                match &trial.outcome {
                    TrialOutcome::Succeeded(meta) => {
                        aggregate.record(trial.elapsed_ms);
                        metrics::record_trial_success(&size.tag(), size.bytes(), trial.elapsed_ms);
                        report.trial_success(&trial, meta)?;

                        self.cleanup(&key, report).await?;
                        index += 1;
                        break;
                    }
                    TrialOutcome::Failed(error) => {
                        metrics::record_trial_failure(&size.tag());
                        log_storage_error("upload", &key, error);
                        report.upload_failed(&key, error)?;

                        if !self.options.retry.allows_retry(attempt) {
                            tracing::error!(key = %key, attempts = attempt, "Giving up on payload size");
                            report.gave_up(size, attempt)?;
                            abandoned = true;
                            break 'trials;
                        }
                        tokio::time::sleep(self.options.retry.backoff(attempt)).await;
                    }
                }
            }
        }

        let summary = SizeSummary::new(size, aggregate, abandoned);
        report.size_summary(&summary)?;
        Ok(summary)
    }

    /// Time one Put on the monotonic clock
    async fn run_trial(
        &self,
        size: PayloadSize,
        key: &str,
        attempt: u32,
        payload: Bytes,
    ) -> TrialResult {
        let start = Instant::now();
        let result = self.store.put(key, payload).await;
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = match result {
            Ok(meta) => TrialOutcome::Succeeded(meta),
            Err(error) => TrialOutcome::Failed(error),
        };

        tracing::debug!(key = %key, attempt, elapsed_ms, success = matches!(outcome, TrialOutcome::Succeeded(_)), "Trial finished");

        TrialResult {
            size,
            key: key.to_string(),
            attempt,
            elapsed_ms,
            outcome,
        }
    }

    /// Delete the uploaded object; failures leak the object but never stop the run
    async fn cleanup<W: Write>(&self, key: &str, report: &mut Report<W>) -> Result<(), BenchError> {
        match self.store.delete(key).await {
            Ok(_) => {
                metrics::record_delete(true);
                Ok(())
            }
            Err(error) => {
                metrics::record_delete(false);
                log_storage_error("delete", key, &error);
                report.delete_failed(key, &error)?;
                Ok(())
            }
        }
    }
}

/// Structured log for a classified storage error
fn log_storage_error(operation: &str, key: &str, error: &StorageError) {
    metrics::record_error(operation, error.kind());

    match error {
        StorageError::NotFound { request_id } => {
            tracing::warn!(
                operation,
                key = %key,
                request_id = request_id.as_deref().unwrap_or(""),
                "Resource does not exist"
            );
        }
        StorageError::Service(e) => {
            tracing::error!(
                operation,
                key = %key,
                code = %e.code,
                message = %e.message,
                resource = %e.resource,
                request_id = %e.request_id,
                status = e.status,
                "COS service error"
            );
        }
        StorageError::Transport(message) => {
            tracing::error!(operation, key = %key, error = %message, "COS request failed");
        }
    }
}
