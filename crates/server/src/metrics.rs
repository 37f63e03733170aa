//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Metric definitions (counters and gauges)
//! - Helper functions for recording metrics

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use peekaboo_db::{BackupOutcome, CleanupReport};
use std::sync::OnceLock;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// This should be called once at application startup, before any metrics are recorded.
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("Failed to set global metrics recorder (already set)");
        return false;
    }

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Failed to store Prometheus handle (already set)");
    }

    describe_metrics();

    tracing::info!("Prometheus metrics initialized");
    true
}

fn describe_metrics() {
    describe_counter!(
        "peekaboo_progress_writes_total",
        "Progress rows written, by kind (save, manual, delete)"
    );
    describe_counter!(
        "peekaboo_backups_total",
        "Backup attempts, by trigger and result"
    );
    describe_counter!(
        "peekaboo_backups_pruned_total",
        "Old backup files deleted by retention cleanup"
    );
    describe_counter!("peekaboo_restores_total", "Database restores, by source");
    describe_gauge!("peekaboo_database_bytes", "Size of the primary database file");
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

pub fn record_progress_write(kind: &'static str) {
    counter!("peekaboo_progress_writes_total", "kind" => kind).increment(1);
}

/// Record a backup attempt. `trigger` names what asked for it, e.g. "auto".
pub fn record_backup(trigger: &'static str, outcome: &BackupOutcome) {
    let result = match outcome {
        BackupOutcome::Created { cleanup, .. } => {
            record_cleanup(cleanup);
            "created"
        }
        BackupOutcome::Skipped => "skipped",
        BackupOutcome::Failed(_) => "failed",
    };
    counter!("peekaboo_backups_total", "trigger" => trigger, "result" => result).increment(1);
}

pub fn record_cleanup(report: &CleanupReport) {
    if !report.removed.is_empty() {
        counter!("peekaboo_backups_pruned_total").increment(report.removed.len() as u64);
    }
}

pub fn record_restore(source: &'static str) {
    counter!("peekaboo_restores_total", "source" => source).increment(1);
}

pub fn record_database_size(bytes: u64) {
    gauge!("peekaboo_database_bytes").set(bytes as f64);
}
