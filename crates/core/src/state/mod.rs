//! Persistent per-torrent health state.

mod json_store;
mod store;
mod types;

pub use json_store::JsonStateStore;
pub use store::{StateError, StateStore};
pub use types::{Distribution, HealthState, LastChecked, TorrentHealthRecord};
