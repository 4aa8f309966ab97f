//! Logging setup
//!
//! Diagnostics go to stderr through a `tracing-subscriber` fmt layer so that
//! stdout carries only the benchmark report. `RUST_LOG` overrides the level
//! given on the command line.

use clap::ValueEnum;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Errors that can occur during logging initialization
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{0}'")]
    InvalidFilter(String),

    #[error("Failed to install subscriber")]
    SubscriberError(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Build the filter: `RUST_LOG` when set, otherwise `level`
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level.to_lowercase())
            .map_err(|_| LoggingError::InvalidFilter(level.to_string())),
    }
}

/// Install the global subscriber
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), LoggingError> {
    let filter = build_filter(level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }

    Ok(())
}
