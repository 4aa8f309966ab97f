//! cos-speedtest Library
//!
//! Sequential upload throughput benchmark for Tencent COS buckets.
//!
//! # Features
//!
//! - **Single Stream**: one upload in flight at a time, so figures describe
//!   per-connection throughput rather than aggregate bandwidth
//! - **Self Cleaning**: every uploaded object is deleted right after timing
//! - **Bounded Retry**: failed uploads are re-attempted with backoff, never
//!   counted toward throughput
//! - **Scriptable**: results go to stdout, diagnostics to stderr
//!
//! # Example
//!
//! ```no_run
//! use cos_speedtest::bench::{BenchmarkRunner, Report, RunnerOptions, TestPlan};
//! use cos_speedtest::{Config, CosClient};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.json")?;
//!     let client = CosClient::from_config(&config, None)?;
//!     let runner = BenchmarkRunner::new(&client, TestPlan::default(), RunnerOptions::default());
//!     runner.run(&mut Report::new(std::io::stdout())).await?;
//!     Ok(())
//! }
//! ```

pub mod bench;
pub mod config;
pub mod cos;
pub mod logging;
pub mod metrics;

// Re-export commonly used types
pub use bench::{BenchmarkRunner, TestPlan};
pub use config::Config;
pub use cos::{CosClient, ObjectStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
