//! qBittorrent Web API v2 client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::QBittorrentConfig;
use crate::health::Classification;

use super::{TorrentClient, TorrentClientError, TorrentInfo, TorrentState};

/// qBittorrent client implementation.
pub struct QBittorrentClient {
    client: Client,
    config: QBittorrentConfig,
    /// Whether the cookie jar holds a live session (reset on HTTP 403).
    authenticated: RwLock<bool>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: QBittorrentConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .build()
            .map_err(|e| {
                TorrentClientError::ConnectionFailed(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            authenticated: RwLock::new(false),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Login and store the session cookie.
    async fn login(&self) -> Result<(), TorrentClientError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            *self.authenticated.write().await = true;
            Ok(())
        } else if body.contains("Fails.") || status == StatusCode::FORBIDDEN {
            Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(TorrentClientError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), TorrentClientError> {
        if *self.authenticated.read().await {
            return Ok(());
        }
        self.login().await
    }

    /// Send an authenticated request, re-authenticating once on HTTP 403.
    async fn send<F>(&self, endpoint: &str, build: F) -> Result<String, TorrentClientError>
    where
        F: Fn(&Client, &str) -> RequestBuilder,
    {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let mut response = build(&self.client, &url)
            .send()
            .await
            .map_err(map_send_error)?;

        if response.status() == StatusCode::FORBIDDEN {
            warn!("qBittorrent session expired, re-authenticating");
            *self.authenticated.write().await = false;
            self.login().await?;

            response = build(&self.client, &url)
                .send()
                .await
                .map_err(map_send_error)?;
        }

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TorrentClientError::EndpointNotFound(endpoint.to_string()));
        }
        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| TorrentClientError::ApiError(e.to_string()))
    }

    async fn get(&self, endpoint: &str) -> Result<String, TorrentClientError> {
        self.send(endpoint, |client, url| client.get(url)).await
    }

    async fn post_form(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<String, TorrentClientError> {
        self.send(endpoint, |client, url| client.post(url).form(params))
            .await
    }

    async fn tracker_seeders_max(&self, hash: &str) -> Result<u32, TorrentClientError> {
        let endpoint = format!(
            "/api/v2/torrents/trackers?hash={}",
            urlencoding::encode(hash)
        );
        let response = self.get(&endpoint).await?;
        let trackers: Vec<QBTracker> = serde_json::from_str(&response).map_err(|e| {
            TorrentClientError::ApiError(format!("Failed to parse trackers: {}", e))
        })?;

        Ok(max_tracker_seeds(&trackers))
    }
}

fn map_send_error(e: reqwest::Error) -> TorrentClientError {
    if e.is_timeout() {
        TorrentClientError::Timeout
    } else if e.is_connect() {
        TorrentClientError::ConnectionFailed(e.to_string())
    } else {
        TorrentClientError::ApiError(e.to_string())
    }
}

/// Entry of `/api/v2/torrents/info`.
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    hash: String,
    name: String,
    state: String,
    /// Complete peers according to trackers.
    #[serde(default)]
    num_complete: i64,
    /// Seeders we are connected to.
    #[serde(default)]
    num_seeds: i64,
    /// Queue position; 0 or -1 when queueing is off or the torrent is not queued.
    #[serde(default)]
    priority: i64,
}

impl QBTorrentInfo {
    fn into_torrent_info(self) -> TorrentInfo {
        let state = parse_qb_state(&self.state);
        TorrentInfo {
            hash: self.hash.to_lowercase(),
            name: self.name,
            is_paused: state == TorrentState::Paused,
            is_queued: self.priority > 0,
            state,
            tracker_seeders: seeder_figure(self.num_complete),
            connected_seeders: seeder_figure(self.num_seeds),
        }
    }
}

/// Entry of `/api/v2/torrents/trackers`.
#[derive(Debug, Deserialize)]
struct QBTracker {
    #[serde(default)]
    num_seeds: i64,
}

/// A seeder figure as reported by qBittorrent: -1 means unknown, and
/// out-of-range counts saturate.
fn seeder_figure(raw: i64) -> u32 {
    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}

/// Highest seeder count any tracker reports. DHT/PeX rows report -1.
fn max_tracker_seeds(trackers: &[QBTracker]) -> u32 {
    trackers
        .iter()
        .map(|t| seeder_figure(t.num_seeds))
        .max()
        .unwrap_or(0)
}

/// Parse qBittorrent state string to TorrentState.
fn parse_qb_state(state: &str) -> TorrentState {
    match state {
        "downloading" | "forcedDL" | "metaDL" | "forcedMetaDL" | "allocating" => {
            TorrentState::Downloading
        }
        "uploading" | "forcedUP" => TorrentState::Seeding,
        "stalledUP" => TorrentState::StalledSeeding,
        "stalledDL" => TorrentState::StalledDownloading,
        "pausedDL" | "pausedUP" | "stoppedDL" | "stoppedUP" => TorrentState::Paused,
        "checkingDL" | "checkingUP" | "checkingResumeData" | "moving" => TorrentState::Checking,
        "queuedDL" | "queuedUP" => TorrentState::Queued,
        "error" | "missingFiles" => TorrentState::Error,
        _ => TorrentState::Unknown,
    }
}

/// Our own contribution to the seeder count.
fn own_seed(torrent: &TorrentInfo) -> u32 {
    u32::from(torrent.state.is_seeding())
}

/// Seeder count from list-level figures alone, if they say anything.
fn list_level_seeders(torrent: &TorrentInfo) -> Option<u32> {
    if torrent.tracker_seeders > 0 {
        Some(torrent.tracker_seeders)
    } else if torrent.connected_seeders > 0 {
        Some(torrent.connected_seeders.saturating_add(own_seed(torrent)))
    } else {
        None
    }
}

/// Number of `decreasePrio` steps after `topPrio`, so CRITICAL ends above RARE above LOW.
fn priority_steps_below_top(classification: Classification) -> usize {
    match classification {
        Classification::Critical => 0,
        Classification::Rare => 1,
        Classification::Low | Classification::Healthy => 2,
    }
}

#[async_trait]
impl TorrentClient for QBittorrentClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        let response = self.get("/api/v2/torrents/info").await?;
        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&response).map_err(|e| {
            TorrentClientError::ApiError(format!("Failed to parse response: {}", e))
        })?;

        Ok(torrents.into_iter().map(|t| t.into_torrent_info()).collect())
    }

    async fn seeder_count(&self, torrent: &TorrentInfo) -> Result<u32, TorrentClientError> {
        if let Some(count) = list_level_seeders(torrent) {
            return Ok(count);
        }

        let max = self.tracker_seeders_max(&torrent.hash).await?;
        Ok(if max > 0 { max } else { own_seed(torrent) })
    }

    async fn resume_torrent(&self, hash: &str) -> Result<(), TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        match self
            .post_form("/api/v2/torrents/resume", &[("hashes", &hash_lower)])
            .await
        {
            // qBittorrent 5 renamed resume to start.
            Err(TorrentClientError::EndpointNotFound(_)) => {
                self.post_form("/api/v2/torrents/start", &[("hashes", &hash_lower)])
                    .await?;
            }
            other => {
                other?;
            }
        }
        Ok(())
    }

    async fn boost_priority(
        &self,
        hash: &str,
        classification: Classification,
    ) -> Result<(), TorrentClientError> {
        let hash_lower = hash.to_lowercase();
        self.post_form("/api/v2/torrents/topPrio", &[("hashes", &hash_lower)])
            .await?;
        for _ in 0..priority_steps_below_top(classification) {
            self.post_form("/api/v2/torrents/decreasePrio", &[("hashes", &hash_lower)])
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(state: TorrentState, tracker: u32, connected: u32) -> TorrentInfo {
        TorrentInfo {
            hash: "abc".to_string(),
            name: "Test".to_string(),
            state,
            is_paused: state == TorrentState::Paused,
            is_queued: false,
            tracker_seeders: tracker,
            connected_seeders: connected,
        }
    }

    #[test]
    fn test_parse_qb_state_seeding() {
        assert_eq!(parse_qb_state("uploading"), TorrentState::Seeding);
        assert_eq!(parse_qb_state("forcedUP"), TorrentState::Seeding);
        assert_eq!(parse_qb_state("stalledUP"), TorrentState::StalledSeeding);
    }

    #[test]
    fn test_parse_qb_state_paused() {
        assert_eq!(parse_qb_state("pausedDL"), TorrentState::Paused);
        assert_eq!(parse_qb_state("pausedUP"), TorrentState::Paused);
        assert_eq!(parse_qb_state("stoppedDL"), TorrentState::Paused);
        assert_eq!(parse_qb_state("stoppedUP"), TorrentState::Paused);
    }

    #[test]
    fn test_parse_qb_state_other() {
        assert_eq!(parse_qb_state("forcedMetaDL"), TorrentState::Downloading);
        assert_eq!(parse_qb_state("stalledDL"), TorrentState::StalledDownloading);
        assert_eq!(parse_qb_state("queuedUP"), TorrentState::Queued);
        assert_eq!(parse_qb_state("checkingResumeData"), TorrentState::Checking);
        assert_eq!(parse_qb_state("missingFiles"), TorrentState::Error);
        assert_eq!(parse_qb_state("something_else"), TorrentState::Unknown);
    }

    #[test]
    fn test_qb_torrent_info_conversion() {
        let json = r#"[{
            "hash": "ABCDEF0123",
            "name": "Rare Field Recordings",
            "state": "stoppedUP",
            "num_complete": -1,
            "num_seeds": 0,
            "priority": 3,
            "size": 123456,
            "ratio": 1.5
        }]"#;
        let parsed: Vec<QBTorrentInfo> = serde_json::from_str(json).unwrap();
        let info = parsed.into_iter().next().unwrap().into_torrent_info();

        assert_eq!(info.hash, "abcdef0123");
        assert_eq!(info.state, TorrentState::Paused);
        assert!(info.is_paused);
        assert!(info.is_queued);
        assert_eq!(info.tracker_seeders, 0);
    }

    #[test]
    fn test_unqueued_priority() {
        for priority in [0, -1] {
            let qb = QBTorrentInfo {
                hash: "a".into(),
                name: "a".into(),
                state: "uploading".into(),
                num_complete: 0,
                num_seeds: 0,
                priority,
            };
            assert!(!qb.into_torrent_info().is_queued);
        }
    }

    #[test]
    fn test_seeder_figure_saturates() {
        assert_eq!(seeder_figure(-1), 0);
        assert_eq!(seeder_figure(42), 42);
        assert_eq!(seeder_figure(i64::from(u32::MAX)), u32::MAX);
        assert_eq!(seeder_figure(i64::from(u32::MAX) + 1), u32::MAX);
        assert_eq!(seeder_figure(i64::MAX), u32::MAX);
    }

    #[test]
    fn test_huge_tracker_count_is_not_wrapped() {
        // 2^32 + 1 would wrap to 1 seeder with a plain cast.
        let json = r#"[{
            "hash": "abc",
            "name": "Everyone Has This",
            "state": "uploading",
            "num_complete": 4294967297,
            "num_seeds": 4294967296
        }]"#;
        let parsed: Vec<QBTorrentInfo> = serde_json::from_str(json).unwrap();
        let info = parsed.into_iter().next().unwrap().into_torrent_info();

        assert_eq!(info.tracker_seeders, u32::MAX);
        assert_eq!(info.connected_seeders, u32::MAX);
        assert_eq!(list_level_seeders(&info), Some(u32::MAX));

        let connected_only = TorrentInfo {
            tracker_seeders: 0,
            ..info
        };
        assert_eq!(list_level_seeders(&connected_only), Some(u32::MAX));
    }

    #[test]
    fn test_list_level_prefers_tracker_count() {
        let t = info(TorrentState::Seeding, 7, 3);
        assert_eq!(list_level_seeders(&t), Some(7));
    }

    #[test]
    fn test_list_level_connected_adds_own_seed() {
        assert_eq!(list_level_seeders(&info(TorrentState::Seeding, 0, 2)), Some(3));
        assert_eq!(
            list_level_seeders(&info(TorrentState::StalledSeeding, 0, 2)),
            Some(3)
        );
        assert_eq!(list_level_seeders(&info(TorrentState::Paused, 0, 2)), Some(2));
    }

    #[test]
    fn test_list_level_unknown_needs_trackers() {
        assert_eq!(list_level_seeders(&info(TorrentState::Seeding, 0, 0)), None);
    }

    #[test]
    fn test_priority_steps() {
        assert_eq!(priority_steps_below_top(Classification::Critical), 0);
        assert_eq!(priority_steps_below_top(Classification::Rare), 1);
        assert_eq!(priority_steps_below_top(Classification::Low), 2);
    }

    #[test]
    fn test_trackers_parse_max() {
        let json = r#"[
            {"url": "** [DHT] **", "num_seeds": -1},
            {"url": "udp://a", "num_seeds": 4},
            {"url": "udp://b", "num_seeds": 2}
        ]"#;
        let trackers: Vec<QBTracker> = serde_json::from_str(json).unwrap();
        assert_eq!(max_tracker_seeds(&trackers), 4);
        assert_eq!(max_tracker_seeds(&[]), 0);
    }

    #[tokio::test]
    async fn test_unreachable_client_fails_to_list() {
        let client = QBittorrentClient::new(QBittorrentConfig {
            url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();

        let err = client.list_torrents().await.unwrap_err();
        assert!(err.is_unavailable(), "unexpected error: {:?}", err);
    }
}
