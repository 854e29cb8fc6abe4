//! Mock torrent client for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::health::Classification;
use crate::torrent_client::{TorrentClient, TorrentClientError, TorrentInfo, TorrentState};

/// A recorded action for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedAction {
    Resume(String),
    BoostPriority(String, Classification),
}

/// Internal state for a mock torrent.
#[derive(Debug, Clone)]
struct MockTorrentState {
    info: TorrentInfo,
    seeders: u32,
}

/// Mock implementation of the TorrentClient trait.
///
/// Provides controllable behavior for testing:
/// - Script torrents and their seeder counts
/// - Record resume/priority actions for assertions
/// - Simulate whole-client and per-torrent failures
/// - Simulate slow responses
///
/// # Example
///
/// ```rust,ignore
/// let client = MockTorrentClient::new();
/// client.add_torrent("abc123", "Rare Album", 1).await;
/// client.set_paused("abc123", true).await;
///
/// // Run a cycle...
///
/// let actions = client.recorded_actions().await;
/// assert_eq!(actions, vec![RecordedAction::Resume("abc123".into())]);
/// ```
#[derive(Debug, Default)]
pub struct MockTorrentClient {
    /// Torrents in listing order.
    torrents: Arc<RwLock<Vec<MockTorrentState>>>,
    /// Recorded resume/boost calls.
    actions: Arc<RwLock<Vec<RecordedAction>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<TorrentClientError>>>,
    /// Hashes whose seeder count fetch always fails.
    seeder_errors: Arc<RwLock<HashMap<String, TorrentClientError>>>,
    /// Hashes whose actions always fail.
    action_errors: Arc<RwLock<HashMap<String, TorrentClientError>>>,
    /// Artificial latency for every operation.
    delay: Arc<RwLock<Option<Duration>>>,
    list_calls: Arc<RwLock<usize>>,
}

impl MockTorrentClient {
    /// Create a new mock torrent client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a seeding torrent with the given seeder count.
    pub async fn add_torrent(&self, hash: &str, name: &str, seeders: u32) {
        self.add_mock_torrent(
            TorrentInfo {
                hash: hash.to_string(),
                name: name.to_string(),
                state: TorrentState::Seeding,
                is_paused: false,
                is_queued: false,
                tracker_seeders: seeders,
                connected_seeders: 0,
            },
            seeders,
        )
        .await;
    }

    /// Pre-populate a torrent with full control over its listing.
    pub async fn add_mock_torrent(&self, info: TorrentInfo, seeders: u32) {
        let mut torrents = self.torrents.write().await;
        torrents.retain(|t| t.info.hash != info.hash);
        torrents.push(MockTorrentState { info, seeders });
    }

    /// Remove a torrent from the listing.
    pub async fn remove_torrent(&self, hash: &str) {
        self.torrents.write().await.retain(|t| t.info.hash != hash);
    }

    /// Set the seeder count reported for a torrent.
    pub async fn set_seeders(&self, hash: &str, seeders: u32) {
        self.update(hash, |t| {
            t.seeders = seeders;
            t.info.tracker_seeders = seeders;
        })
        .await;
    }

    /// Pause or unpause a torrent.
    pub async fn set_paused(&self, hash: &str, paused: bool) {
        self.update(hash, |t| set_paused_state(t, paused)).await;
    }

    /// Put a torrent in or out of the queue.
    pub async fn set_queued(&self, hash: &str, queued: bool) {
        self.update(hash, |t| t.info.is_queued = queued).await;
    }

    /// Make every seeder count fetch for `hash` fail.
    pub async fn fail_seeder_count(&self, hash: &str, error: TorrentClientError) {
        self.seeder_errors
            .write()
            .await
            .insert(hash.to_string(), error);
    }

    /// Make every action on `hash` fail.
    pub async fn fail_actions(&self, hash: &str, error: TorrentClientError) {
        self.action_errors
            .write()
            .await
            .insert(hash.to_string(), error);
    }

    /// Clear all per-torrent failures.
    pub async fn clear_failures(&self) {
        self.seeder_errors.write().await.clear();
        self.action_errors.write().await.clear();
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: TorrentClientError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every operation by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get all recorded actions.
    pub async fn recorded_actions(&self) -> Vec<RecordedAction> {
        self.actions.read().await.clone()
    }

    /// Clear recorded actions.
    pub async fn clear_recorded(&self) {
        self.actions.write().await.clear();
    }

    /// Number of `list_torrents` calls so far.
    pub async fn list_calls(&self) -> usize {
        *self.list_calls.read().await
    }

    /// Current listing of a torrent.
    pub async fn torrent(&self, hash: &str) -> Option<TorrentInfo> {
        self.torrents
            .read()
            .await
            .iter()
            .find(|t| t.info.hash == hash)
            .map(|t| t.info.clone())
    }

    async fn update<F>(&self, hash: &str, f: F)
    where
        F: FnOnce(&mut MockTorrentState),
    {
        if let Some(torrent) = self
            .torrents
            .write()
            .await
            .iter_mut()
            .find(|t| t.info.hash == hash)
        {
            f(torrent);
        }
    }

    /// Apply the configured delay, then take the next error if set.
    async fn begin(&self) -> Result<(), TorrentClientError> {
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn apply_action(
        &self,
        hash: &str,
        action: RecordedAction,
    ) -> Result<(), TorrentClientError> {
        self.begin().await?;

        if let Some(err) = self.action_errors.read().await.get(hash) {
            return Err(err.clone());
        }
        if self.torrent(hash).await.is_none() {
            return Err(TorrentClientError::TorrentNotFound(hash.to_string()));
        }

        if let RecordedAction::Resume(_) = action {
            self.update(hash, |t| set_paused_state(t, false)).await;
        }
        self.actions.write().await.push(action);
        Ok(())
    }
}

fn set_paused_state(torrent: &mut MockTorrentState, paused: bool) {
    torrent.info.is_paused = paused;
    torrent.info.state = if paused {
        TorrentState::Paused
    } else {
        TorrentState::Seeding
    };
}

#[async_trait]
impl TorrentClient for MockTorrentClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentInfo>, TorrentClientError> {
        *self.list_calls.write().await += 1;
        self.begin().await?;

        Ok(self
            .torrents
            .read()
            .await
            .iter()
            .map(|t| t.info.clone())
            .collect())
    }

    async fn seeder_count(&self, torrent: &TorrentInfo) -> Result<u32, TorrentClientError> {
        self.begin().await?;

        if let Some(err) = self.seeder_errors.read().await.get(&torrent.hash) {
            return Err(err.clone());
        }

        self.torrents
            .read()
            .await
            .iter()
            .find(|t| t.info.hash == torrent.hash)
            .map(|t| t.seeders)
            .ok_or_else(|| TorrentClientError::TorrentNotFound(torrent.hash.clone()))
    }

    async fn resume_torrent(&self, hash: &str) -> Result<(), TorrentClientError> {
        self.apply_action(hash, RecordedAction::Resume(hash.to_string()))
            .await
    }

    async fn boost_priority(
        &self,
        hash: &str,
        classification: Classification,
    ) -> Result<(), TorrentClientError> {
        self.apply_action(
            hash,
            RecordedAction::BoostPriority(hash.to_string(), classification),
        )
        .await
    }
}
