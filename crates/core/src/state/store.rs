//! Health state storage trait.

use std::path::PathBuf;

use thiserror::Error;

use super::types::HealthState;

/// Errors from loading or saving health state.
#[derive(Debug, Error)]
pub enum StateError {
    /// The backing file exists but could not be read or written.
    #[error("state file I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing file exists but is not a valid state document.
    #[error("state file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to serialize state: {0}")]
    Serialize(String),
}

/// Durable storage for [`HealthState`].
///
/// Pure data access. `load` on a missing backing file yields an empty state;
/// `save` must replace the stored state atomically.
pub trait StateStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    fn load(&self) -> Result<HealthState, StateError>;

    fn save(&self, state: &HealthState) -> Result<(), StateError>;
}
