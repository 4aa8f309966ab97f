//! Benchmark module
//!
//! Drives the sequential upload/delete loop against an [`ObjectStore`] and
//! turns elapsed times into throughput figures.
//!
//! [`ObjectStore`]: crate::cos::ObjectStore

use crate::cos::{ResponseMeta, StorageError};
use bytes::Bytes;

pub mod plan;
pub mod report;
pub mod runner;

pub use plan::{PayloadSize, PlanError, TestPlan};
pub use report::Report;
pub use runner::{BenchError, BenchmarkRunner, RetryPolicy, RunnerOptions};

/// Byte the synthetic payload is filled with
pub const PAYLOAD_BYTE: u8 = b't';

/// Smallest elapsed time used as a divisor, in milliseconds
pub const MIN_ELAPSED_MS: u64 = 1;

/// Generate the in-memory payload for a size
///
/// Fails when the size does not fit in this platform's address space.
pub fn generate_payload(size: PayloadSize) -> Result<Bytes, PlanError> {
    let len = usize::try_from(size.bytes()).map_err(|_| PlanError::TooLarge(size.tag()))?;
    Ok(Bytes::from(vec![PAYLOAD_BYTE; len]))
}

/// Object key for one trial: `<prefix>testfile<tag>-<index>`
pub fn object_key(prefix: &str, size: PayloadSize, index: u32) -> String {
    format!("{}testfile{}-{}", prefix, size.tag(), index)
}

/// Throughput in MB/s, with the elapsed time floored at [`MIN_ELAPSED_MS`]
pub fn speed_mb_per_sec(megabytes: f64, elapsed_ms: u64) -> f64 {
    megabytes / (elapsed_ms.max(MIN_ELAPSED_MS) as f64 / 1000.0)
}

/// Outcome of one upload attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrialOutcome {
    Succeeded(ResponseMeta),
    Failed(StorageError),
}

/// One upload attempt
#[derive(Debug, Clone)]
pub struct TrialResult {
    pub size: PayloadSize,
    pub key: String,
    /// 1-based attempt number for this key
    pub attempt: u32,
    pub elapsed_ms: u64,
    pub outcome: TrialOutcome,
}

impl TrialResult {
    /// Per-trial throughput in MB/s
    pub fn speed(&self) -> f64 {
        speed_mb_per_sec(self.size.megabytes(), self.elapsed_ms)
    }
}

/// Running totals over the successful trials of one size
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SizeAggregate {
    total_elapsed_ms: u64,
    successes: u32,
}

impl SizeAggregate {
    pub fn record(&mut self, elapsed_ms: u64) {
        self.total_elapsed_ms = self.total_elapsed_ms.saturating_add(elapsed_ms);
        self.successes += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn total_elapsed_ms(&self) -> u64 {
        self.total_elapsed_ms
    }

    pub fn successes(&self) -> u32 {
        self.successes
    }

    /// Average throughput in MB/s, `None` without any successful trial
    pub fn average_speed(&self, size: PayloadSize) -> Option<f64> {
        if self.successes == 0 {
            return None;
        }
        Some(speed_mb_per_sec(
            size.megabytes() * self.successes as f64,
            self.total_elapsed_ms,
        ))
    }
}

/// Result of the loop for one payload size
#[derive(Debug, Clone, PartialEq)]
pub struct SizeSummary {
    pub size: PayloadSize,
    pub successes: u32,
    pub total_elapsed_ms: u64,
    pub average_speed: Option<f64>,
    /// The retry policy gave up before all repetitions succeeded
    pub abandoned: bool,
}

impl SizeSummary {
    pub fn new(size: PayloadSize, aggregate: &SizeAggregate, abandoned: bool) -> Self {
        Self {
            size,
            successes: aggregate.successes(),
            total_elapsed_ms: aggregate.total_elapsed_ms(),
            average_speed: aggregate.average_speed(size),
            abandoned,
        }
    }
}
