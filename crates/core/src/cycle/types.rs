//! Types for the check cycle.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::health::{interval_from_days, Action, ActionPolicy, Thresholds};
use crate::state::{Distribution, StateError};
use crate::torrent_client::TorrentClientError;

/// Errors that abort a whole cycle. Per-torrent failures never end up here.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Health state could not be loaded or saved.
    #[error("state storage error: {0}")]
    State(#[from] StateError),

    /// The torrent client could not be reached or refused our credentials.
    #[error("torrent client unavailable: {0}")]
    ClientUnavailable(#[source] TorrentClientError),

    /// The client answered the list call, but not with a usable torrent list.
    #[error("failed to list torrents: {0}")]
    ListFailed(#[source] TorrentClientError),
}

impl CycleError {
    /// Label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            CycleError::State(_) => "state_error",
            CycleError::ClientUnavailable(_) => "client_unavailable",
            CycleError::ListFailed(_) => "list_failed",
        }
    }
}

impl From<TorrentClientError> for CycleError {
    fn from(err: TorrentClientError) -> Self {
        if err.is_unavailable() {
            CycleError::ClientUnavailable(err)
        } else {
            CycleError::ListFailed(err)
        }
    }
}

/// Settings a cycle runs with, fixed for the cycle's duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSettings {
    pub thresholds: Thresholds,
    pub policy: ActionPolicy,
    /// Minimum time between two checks of the same torrent.
    pub check_interval: Duration,
    /// Upper bound on any single torrent client call.
    pub call_timeout: StdDuration,
}

impl CycleSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            thresholds: config.thresholds,
            policy: config.actions,
            check_interval: interval_from_days(config.schedule.check_interval_days),
            // Covers a re-login plus the multi-request priority boost.
            call_timeout: StdDuration::from_secs(config.qbittorrent.timeout_secs.saturating_mul(4)),
        }
    }
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Where a per-torrent failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "action", rename_all = "snake_case")]
pub enum FailureStage {
    /// Seeder count could not be fetched; the torrent was skipped.
    Fetch,
    /// The check succeeded but an action could not be applied.
    Action(Action),
}

/// A per-torrent failure within a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentFailure {
    pub hash: String,
    pub name: String,
    #[serde(flatten)]
    pub stage: FailureStage,
    pub error: String,
}

/// Counts for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    /// Torrents listed by the client.
    pub total_torrents: usize,
    /// Torrents whose check was due.
    pub due_torrents: usize,
    /// Due torrents successfully checked.
    pub checked: usize,
    /// Due torrents whose seeder count could not be fetched.
    pub skipped: usize,
    /// Classifications found by this cycle's checks.
    pub checked_distribution: Distribution,
    /// Last classification of every listed torrent with a record.
    pub distribution: Distribution,
    pub actions_applied: usize,
    pub actions_failed: usize,
}

/// Outcome of a cycle that ran to the end or was interrupted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// The instant the whole cycle was evaluated against.
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Shutdown was requested before all due torrents were checked.
    pub interrupted: bool,
    pub summary: CycleSummary,
    pub failures: Vec<TorrentFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_default_config() {
        let settings = CycleSettings::default();
        assert_eq!(settings.check_interval, Duration::days(30));
        assert_eq!(settings.call_timeout, StdDuration::from_secs(120));
        assert_eq!(settings.thresholds, Thresholds::new(1, 2, 5));
    }

    #[test]
    fn test_list_error_split() {
        let down = CycleError::from(TorrentClientError::AuthenticationFailed("Fails.".into()));
        assert!(matches!(down, CycleError::ClientUnavailable(_)));
        assert_eq!(down.kind(), "client_unavailable");
        assert_eq!(
            CycleError::from(TorrentClientError::Timeout).kind(),
            "client_unavailable"
        );

        let bad = CycleError::from(TorrentClientError::ApiError("HTTP 500".into()));
        assert!(matches!(bad, CycleError::ListFailed(_)));
        assert_eq!(bad.kind(), "list_failed");
        assert_eq!(bad.to_string(), "failed to list torrents: API error: HTTP 500");
    }

    #[test]
    fn test_failure_serialization() {
        let failure = TorrentFailure {
            hash: "abc".to_string(),
            name: "Test".to_string(),
            stage: FailureStage::Action(Action::Resume),
            error: "HTTP 500".to_string(),
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["stage"], "action");
        assert_eq!(json["action"], "resume");

        let fetch = TorrentFailure {
            stage: FailureStage::Fetch,
            ..failure
        };
        let json = serde_json::to_value(&fetch).unwrap();
        assert_eq!(json["stage"], "fetch");
        assert!(json.get("action").is_none());
    }

    #[test]
    fn test_cycle_error_kind() {
        let err = CycleError::from(TorrentClientError::Timeout);
        assert_eq!(err.kind(), "client_unavailable");
        assert_eq!(err.to_string(), "torrent client unavailable: Request timeout");
    }
}
