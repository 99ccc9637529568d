// crates/server/src/metrics.rs
//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Metric definitions (counters, histograms, gauges)
//! - Helper functions for recording metrics
//! - the data behind the `/metrics` endpoint handler

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
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

/// Describe all application metrics for Prometheus.
fn describe_metrics() {
    describe_counter!(
        "panel_refreshes_total",
        "Refresh requests by panel kind and outcome (fetched, deduplicated, deferred, failed)"
    );
    describe_histogram!(
        "panel_refresh_duration_seconds",
        "Wall time of completed panel fetches in seconds"
    );
    describe_gauge!("panels_active", "Number of live panel instances");
    describe_counter!(
        "upstream_query_errors_total",
        "Upstream query failures by panel kind"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Record the outcome of one refresh request.
pub fn record_refresh(kind: &str, outcome: &str, duration: std::time::Duration) {
    counter!("panel_refreshes_total", "kind" => kind.to_string(), "outcome" => outcome.to_string())
        .increment(1);
    if outcome == "fetched" {
        histogram!("panel_refresh_duration_seconds", "kind" => kind.to_string())
            .record(duration.as_secs_f64());
    }
    if outcome == "failed" {
        counter!("upstream_query_errors_total", "kind" => kind.to_string()).increment(1);
    }
}

/// Record the current number of live panels.
pub fn record_panel_count(count: usize) {
    gauge!("panels_active").set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_refresh_does_not_panic_uninitialized() {
        record_refresh("table", "fetched", std::time::Duration::from_millis(3));
        record_panel_count(2);
    }

    #[test]
    fn test_render_metrics_before_init() {
        // Before init, render_metrics returns None (unless another test initialized it)
        // This is a weak test since test order isn't guaranteed
        let _ = render_metrics();
    }
}
