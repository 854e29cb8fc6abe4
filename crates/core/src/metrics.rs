//! Prometheus metrics for the check cycle.
//!
//! This module provides metrics for:
//! - Cycles (outcome, duration)
//! - Per-torrent checks and failures
//! - Corrective actions
//! - Classification distribution of tracked torrents

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts};

use crate::health::Classification;
use crate::state::Distribution;

// =============================================================================
// Cycle Metrics
// =============================================================================

/// Cycles run by result.
pub static CYCLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("swarmwatch_cycles_total", "Total check cycles run"),
        &["result"], // "completed", "interrupted", "client_unavailable", "state_error"
    )
    .unwrap()
});

/// Cycle duration in seconds.
pub static CYCLE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "swarmwatch_cycle_duration_seconds",
            "Duration of check cycles",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0, 3600.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Torrent Metrics
// =============================================================================

/// Torrents checked by resulting classification.
pub static TORRENTS_CHECKED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "swarmwatch_torrents_checked_total",
            "Total torrent health checks by classification",
        ),
        &["classification"],
    )
    .unwrap()
});

/// Torrents skipped because their seeder count could not be fetched.
pub static TORRENT_CHECK_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "swarmwatch_torrent_check_failures_total",
        "Total torrent health checks that failed",
    )
    .unwrap()
});

/// Tracked torrents by last classification.
pub static TORRENTS_BY_CLASSIFICATION: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "swarmwatch_torrents_by_classification",
            "Tracked torrents by last classification",
        ),
        &["classification"],
    )
    .unwrap()
});

// =============================================================================
// Action Metrics
// =============================================================================

/// Corrective actions by action and result.
pub static ACTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("swarmwatch_actions_total", "Total corrective actions"),
        &["action", "result"], // result: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Publish a classification distribution to the gauge.
pub fn set_distribution(distribution: &Distribution) {
    for tier in Classification::ALL {
        TORRENTS_BY_CLASSIFICATION
            .with_label_values(&[tier.as_str()])
            .set(distribution.get(tier) as i64);
    }
    TORRENTS_BY_CLASSIFICATION
        .with_label_values(&["UNKNOWN"])
        .set(distribution.unknown as i64);
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CYCLES_TOTAL.clone()),
        Box::new(CYCLE_DURATION.clone()),
        Box::new(TORRENTS_CHECKED.clone()),
        Box::new(TORRENT_CHECK_FAILURES.clone()),
        Box::new(TORRENTS_BY_CLASSIFICATION.clone()),
        Box::new(ACTIONS_TOTAL.clone()),
    ]
}
