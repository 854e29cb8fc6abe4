//! Prometheus metrics for the status server.
//!
//! HTTP request metrics live here; cycle and classification metrics are
//! defined in `swarmwatch_core::metrics` and registered alongside them.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "swarmwatch_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("swarmwatch_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "swarmwatch_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Whether the last cycle completed (1) or failed (0).
pub static LAST_CYCLE_SUCCESS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "swarmwatch_last_cycle_success",
        "Whether the most recent check cycle completed without a cycle-level error",
    )
    .unwrap()
});

/// Unix time at which the last successful cycle finished.
pub static LAST_CYCLE_TIMESTAMP: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "swarmwatch_last_cycle_timestamp_seconds",
        "Unix time of the most recent successful check cycle",
    )
    .unwrap()
});

// v1 info-hashes are 40 hex chars, v2 are 64.
static HASH_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9a-fA-F]{40,64}").unwrap());

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(LAST_CYCLE_SUCCESS.clone()))
        .unwrap();
    registry
        .register(Box::new(LAST_CYCLE_TIMESTAMP.clone()))
        .unwrap();

    // Core metrics (cycles, classifications, actions)
    for metric in swarmwatch_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Normalize a path for metric labels (replace torrent hashes with a placeholder).
pub fn normalize_path(path: &str) -> String {
    HASH_REGEX.replace_all(path, "{hash}").to_string()
}
