//! Testing utilities and mock implementations.
//!
//! This module provides a mock torrent client and an in-memory state store,
//! allowing check cycles to be exercised without a real qBittorrent instance
//! or filesystem.
//!
//! # Example
//!
//! ```rust,ignore
//! use swarmwatch_core::testing::{MemoryStateStore, MockTorrentClient};
//!
//! let client = Arc::new(MockTorrentClient::new());
//! let store = Arc::new(MemoryStateStore::new());
//!
//! // Configure mock torrents
//! client.add_torrent("abc123", "Rare Album", 1).await;
//!
//! let runner = CycleRunner::new(client, store, CycleSettings::default());
//! ```

mod memory_state_store;
mod mock_torrent_client;

pub use memory_state_store::MemoryStateStore;
pub use mock_torrent_client::{MockTorrentClient, RecordedAction};
