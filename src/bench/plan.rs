//! Test plan: which payload sizes to upload and how many times

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * 1024;

/// Largest object a single COS PutObject accepts (5 GiB)
pub const MAX_PAYLOAD_BYTES: u64 = 5 * 1024 * MIB;

/// Default number of successful uploads per size
pub const DEFAULT_REPETITIONS: u32 = 10;

/// Test plan errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Payload size must be positive")]
    ZeroSize,

    #[error("Invalid payload size '{0}'")]
    InvalidSize(String),

    #[error("Payload size '{0}' exceeds the 5GB single upload limit")]
    TooLarge(String),

    #[error("Payload size {0} listed more than once")]
    DuplicateSize(String),

    #[error("Repetition count must be at least 1")]
    ZeroRepetitions,

    #[error("Test plan has no payload sizes")]
    Empty,
}

/// A positive payload size in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PayloadSize(u64);

impl PayloadSize {
    pub const ONE_MIB: PayloadSize = PayloadSize(MIB);
    pub const FOUR_MIB: PayloadSize = PayloadSize(4 * MIB);

    pub fn new(bytes: u64) -> Result<Self, PlanError> {
        if bytes == 0 {
            return Err(PlanError::ZeroSize);
        }
        if bytes > MAX_PAYLOAD_BYTES {
            return Err(PlanError::TooLarge(bytes.to_string()));
        }
        Ok(Self(bytes))
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }

    /// Size in MB (1 MB = 1024 * 1024 bytes)
    pub fn megabytes(&self) -> f64 {
        self.0 as f64 / MIB as f64
    }

    /// Short human tag used in object keys and report lines: `4MB`, `512KB`, `1000B`
    pub fn tag(&self) -> String {
        if self.0 % MIB == 0 {
            format!("{}MB", self.0 / MIB)
        } else if self.0 % KIB == 0 {
            format!("{}KB", self.0 / KIB)
        } else {
            format!("{}B", self.0)
        }
    }
}

impl fmt::Display for PayloadSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

impl FromStr for PayloadSize {
    type Err = PlanError;

    /// Accepts plain byte counts and `K`/`KB`/`KiB`, `M`/`MB`/`MiB`, `B`
    /// suffixes (case-insensitive, binary multiples).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        let split = upper
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(upper.len());
        let (digits, unit) = upper.split_at(split);

        let multiplier = match unit.trim() {
            "" | "B" => 1,
            "K" | "KB" | "KIB" => KIB,
            "M" | "MB" | "MIB" => MIB,
            _ => return Err(PlanError::InvalidSize(trimmed.to_string())),
        };

        let value: u64 = digits
            .parse()
            .map_err(|_| PlanError::InvalidSize(trimmed.to_string()))?;
        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| PlanError::TooLarge(trimmed.to_string()))?;

        Self::new(bytes).map_err(|e| match e {
            PlanError::TooLarge(_) => PlanError::TooLarge(trimmed.to_string()),
            other => other,
        })
    }
}

/// Ordered payload sizes, each uploaded `repetitions` times
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPlan {
    sizes: Vec<PayloadSize>,
    repetitions: u32,
}

impl TestPlan {
    /// Create a plan
    ///
    /// Sizes must be non-empty and distinct (object keys are derived from
    /// the size tag); repetitions must be at least 1.
    pub fn new(sizes: Vec<PayloadSize>, repetitions: u32) -> Result<Self, PlanError> {
        if sizes.is_empty() {
            return Err(PlanError::Empty);
        }
        if repetitions == 0 {
            return Err(PlanError::ZeroRepetitions);
        }

        let mut seen = HashSet::with_capacity(sizes.len());
        for size in &sizes {
            if !seen.insert(*size) {
                return Err(PlanError::DuplicateSize(size.tag()));
            }
        }

        Ok(Self { sizes, repetitions })
    }

    /// Parse a comma separated size list such as `1MB,4MB,512KB`
    pub fn parse_sizes(list: &str) -> Result<Vec<PayloadSize>, PlanError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PayloadSize::from_str)
            .collect()
    }

    pub fn sizes(&self) -> &[PayloadSize] {
        &self.sizes
    }

    pub fn repetitions(&self) -> u32 {
        self.repetitions
    }
}

impl Default for TestPlan {
    fn default() -> Self {
        Self {
            sizes: vec![PayloadSize::ONE_MIB, PayloadSize::FOUR_MIB],
            repetitions: DEFAULT_REPETITIONS,
        }
    }
}
