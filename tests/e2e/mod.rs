//! End-to-End Tests for cos-speedtest
//!
//! Validates the complete benchmark: configuration file, SigV4 signed
//! uploads and deletes over HTTP, report lines and process exit status.
//!
//! ## Test Categories
//!
//! - `benchmark_flow`: library-level runs over HTTP
//! - `cli_flow`: binary-level runs

pub mod benchmark_flow;
pub mod cli_flow;
