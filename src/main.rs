//! cos-speedtest - Sequential upload throughput benchmark for Tencent COS
//!
//! Uploads synthetic objects of fixed sizes, times each upload, deletes the
//! object and prints per-trial and average speed.

use anyhow::Context;
use clap::Parser;
use cos_speedtest::bench::{BenchmarkRunner, Report, RetryPolicy, RunnerOptions, TestPlan};
use cos_speedtest::config::{Config, DEFAULT_CONFIG_PATH};
use cos_speedtest::cos::CosClient;
use cos_speedtest::logging::{init_logging, LogFormat};
use cos_speedtest::metrics;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

/// cos-speedtest - Upload throughput benchmark for a COS bucket
#[derive(Parser, Debug)]
#[command(name = "cos-speedtest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to JSON configuration file (SecretID, SecretKey, Region, Bucket)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Payload sizes, comma separated (e.g. 1MB,4MB,512KB)
    #[arg(short, long, default_value = "1MB,4MB")]
    sizes: String,

    /// Successful uploads required per size
    #[arg(short = 'n', long, default_value_t = 10)]
    repetitions: u32,

    /// Consecutive failed attempts per trial before a size is abandoned (0 = unlimited)
    #[arg(long, default_value_t = 10)]
    max_attempts: u32,

    /// Delay after the first failed attempt, doubled after each further failure (ms)
    #[arg(long, default_value_t = 100)]
    retry_backoff_ms: u64,

    /// Upper bound for the retry delay (ms)
    #[arg(long, default_value_t = 5000)]
    max_backoff_ms: u64,

    /// Prefix prepended to every object key
    #[arg(long, default_value = "")]
    key_prefix: String,

    /// Per-request timeout (seconds)
    #[arg(long, default_value_t = 300)]
    timeout_secs: u64,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    print_metrics: bool,

    /// Wait for Enter before exiting
    #[arg(long)]
    pause: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level, args.log_format) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let sizes = TestPlan::parse_sizes(&args.sizes).context("Invalid --sizes")?;
    let plan = TestPlan::new(sizes, args.repetitions).context("Invalid test plan")?;

    let config = Config::load(&args.config).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            args.config.display()
        )
    })?;

    let client = CosClient::from_config(&config, Some(Duration::from_secs(args.timeout_secs)))
        .context("Failed to create COS client")?;
    info!(
        "Starting cos-speedtest v{} against {}",
        cos_speedtest::VERSION,
        client.endpoint()
    );

    let options = RunnerOptions {
        retry: RetryPolicy {
            max_attempts: args.max_attempts,
            initial_backoff: Duration::from_millis(args.retry_backoff_ms),
            max_backoff: Duration::from_millis(args.max_backoff_ms),
        },
        key_prefix: args.key_prefix,
    };

    let mut report = Report::new(std::io::stdout());
    report.banner(&config.region, &config.bucket)?;

    let runner = BenchmarkRunner::new(&client, plan, options);
    runner.run(&mut report).await?;

    if args.print_metrics {
        report.raw(&metrics::render()?)?;
    }

    if args.pause {
        pause_before_exit().await?;
    }

    Ok(())
}

async fn pause_before_exit() -> std::io::Result<()> {
    println!("Press Enter to exit...");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(())
}
