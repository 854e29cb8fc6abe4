//! Types for torrent client operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::health::Classification;

/// Errors that can occur during torrent client operations.
#[derive(Debug, Clone, Error)]
pub enum TorrentClientError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("Endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,
}

impl TorrentClientError {
    /// Whether the error means the client as a whole cannot be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            TorrentClientError::ConnectionFailed(_)
                | TorrentClientError::AuthenticationFailed(_)
                | TorrentClientError::Timeout
        )
    }
}

/// State of a torrent, collapsed from the client's own state names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentState {
    Downloading,
    /// Seeding with active transfer.
    Seeding,
    /// Seeding but no peer is currently downloading from us.
    StalledSeeding,
    StalledDownloading,
    Paused,
    Checking,
    Queued,
    Error,
    Unknown,
}

impl TorrentState {
    /// Whether we are a seeder ourselves in this state.
    pub fn is_seeding(&self) -> bool {
        matches!(self, TorrentState::Seeding | TorrentState::StalledSeeding)
    }
}

/// A torrent as listed by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentInfo {
    /// Info hash (lowercase hex).
    pub hash: String,
    pub name: String,
    pub state: TorrentState,
    /// Paused or stopped by the user.
    pub is_paused: bool,
    /// Has a position in the client's download/upload queue.
    pub is_queued: bool,
    /// Complete peers reported by trackers (swarm-wide).
    pub tracker_seeders: u32,
    /// Seeders we are connected to.
    pub connected_seeders: u32,
}

/// Trait for torrent client backends.
#[async_trait]
pub trait TorrentClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// List all torrents.
    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError>;

    /// Best available seeder count for a listed torrent.
    ///
    /// Tracker-reported figures are preferred over connected peers, which are
    /// preferred over per-tracker estimates.
    async fn seeder_count(&self, torrent: &TorrentInfo) -> Result<u32, TorrentClientError>;

    /// Resume a paused torrent.
    async fn resume_torrent(&self, hash: &str) -> Result<(), TorrentClientError>;

    /// Move a torrent up the queue according to its tier.
    async fn boost_priority(
        &self,
        hash: &str,
        classification: Classification,
    ) -> Result<(), TorrentClientError>;
}
