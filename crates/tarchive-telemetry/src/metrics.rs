//! Prometheus metrics for the token archive.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::TelemetryResult;

/// Snapshots written to archive files.
/// Labels: outcome (created/appended/replaced)
pub static SNAPSHOTS_RECORDED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tarchive_snapshots_recorded_total",
        "Total snapshots written to archive files",
        &["outcome"]
    )
    .unwrap()
});

/// Archive files that failed to parse.
/// Labels: stage (record/export)
pub static CORRUPT_FILES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tarchive_corrupt_files_total",
        "Archive files that could not be parsed",
        &["stage"]
    )
    .unwrap()
});

/// Export requests served.
/// Labels: format (zip/csv/ui), status (HTTP status code)
pub static EXPORTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tarchive_exports_total",
        "Export requests served",
        &["format", "status"]
    )
    .unwrap()
});

/// Tokens (files) included per export.
pub static EXPORT_TOKENS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "tarchive_export_tokens",
        "Number of token files included in one export",
        &["format"],
        vec![0.0, 1.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap()
});

/// Metrics facade.
pub struct Metrics;

impl Metrics {
    /// Record a snapshot write.
    pub fn snapshot_recorded(outcome: &str) {
        SNAPSHOTS_RECORDED_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Record an unparsable archive file.
    pub fn corrupt_file(stage: &str) {
        CORRUPT_FILES_TOTAL.with_label_values(&[stage]).inc();
    }

    /// Record a served export.
    pub fn export_served(format: &str, status: u16) {
        EXPORTS_TOTAL
            .with_label_values(&[format, &status.to_string()])
            .inc();
    }

    /// Record how many token files went into an export.
    pub fn export_size(format: &str, tokens: usize) {
        EXPORT_TOKENS
            .with_label_values(&[format])
            .observe(tokens as f64);
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn gather_text() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}
