//! Torrent client abstraction.
//!
//! This module provides the `TorrentClient` trait the check cycle consumes,
//! and its qBittorrent backend.

mod qbittorrent;
mod types;

pub use qbittorrent::QBittorrentClient;
pub use types::*;
