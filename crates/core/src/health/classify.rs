//! Seeder count to health tier.

use super::types::{Classification, Thresholds};

/// Classify a seeder count against the configured thresholds.
///
/// Thresholds are checked most severe first and the first one satisfied wins,
/// so misordered thresholds still give a well-defined tier. Negative counts
/// are treated as zero.
pub fn classify(seeder_count: i64, thresholds: &Thresholds) -> Classification {
    let seeders = seeder_count.max(0);

    if seeders <= i64::from(thresholds.critical_seeders) {
        Classification::Critical
    } else if seeders <= i64::from(thresholds.rare_seeders) {
        Classification::Rare
    } else if seeders <= i64::from(thresholds.low_seeders) {
        Classification::Low
    } else {
        Classification::Healthy
    }
}
