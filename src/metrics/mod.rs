//! Metrics module
//!
//! Prometheus counters and histograms for trials, printed as text exposition
//! at the end of a run when requested.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    // Trial metrics
    pub static ref TRIALS_TOTAL: CounterVec = register_counter_vec!(
        "cos_speedtest_trials_total",
        "Upload attempts by payload size and outcome",
        &["size", "status"]
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "cos_speedtest_upload_bytes_total",
        "Bytes uploaded by successful trials"
    ).unwrap();

    pub static ref TRIAL_DURATION: HistogramVec = register_histogram_vec!(
        "cos_speedtest_trial_duration_seconds",
        "Successful upload duration in seconds",
        &["size"],
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();

    // Cleanup metrics
    pub static ref DELETES_TOTAL: CounterVec = register_counter_vec!(
        "cos_speedtest_deletes_total",
        "Object deletions after a successful upload",
        &["status"]
    ).unwrap();

    // Error metrics
    pub static ref ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "cos_speedtest_errors_total",
        "Storage errors by operation and classification",
        &["operation", "type"]
    ).unwrap();
}

/// Record a successful upload
pub fn record_trial_success(size: &str, bytes: u64, elapsed_ms: u64) {
    TRIALS_TOTAL.with_label_values(&[size, "success"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
    TRIAL_DURATION
        .with_label_values(&[size])
        .observe(elapsed_ms as f64 / 1000.0);
}

/// Record a failed upload
pub fn record_trial_failure(size: &str) {
    TRIALS_TOTAL.with_label_values(&[size, "failure"]).inc();
}

/// Record the outcome of a cleanup delete
pub fn record_delete(success: bool) {
    let status = if success { "success" } else { "failure" };
    DELETES_TOTAL.with_label_values(&[status]).inc();
}

/// Record a classified storage error
pub fn record_error(operation: &str, error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[operation, error_type]).inc();
}

/// Render all registered metrics in Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
