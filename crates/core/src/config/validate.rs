use tracing::warn;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - qBittorrent URL is set and the request timeout is not 0
/// - Check interval is a finite, non-negative number of days
/// - Run interval is a finite, positive number of hours
/// - HTTP port is not 0 when the status server is enabled
///
/// Misordered thresholds are accepted (classification stays well-defined)
/// but logged.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.qbittorrent.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "qbittorrent.url cannot be empty".to_string(),
        ));
    }

    if config.qbittorrent.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "qbittorrent.timeout_secs cannot be 0".to_string(),
        ));
    }

    let check = config.schedule.check_interval_days;
    if !check.is_finite() || check < 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "schedule.check_interval_days must be a non-negative number, got {}",
            check
        )));
    }

    let run = config.schedule.run_interval_hours;
    if !run.is_finite() || run <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "schedule.run_interval_hours must be a positive number, got {}",
            run
        )));
    }

    if config.http.enabled && config.http.port == 0 {
        return Err(ConfigError::ValidationError(
            "http.port cannot be 0".to_string(),
        ));
    }

    if !config.thresholds.is_strictly_increasing() {
        warn!(
            critical = config.thresholds.critical_seeders,
            rare = config.thresholds.rare_seeders,
            low = config.thresholds.low_seeders,
            "Seeder thresholds are not strictly increasing; the most severe matching tier wins"
        );
    }

    Ok(())
}
