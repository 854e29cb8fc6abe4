//! JSON file state store.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::store::{StateError, StateStore};
use super::types::HealthState;

/// Stores health state as a single pretty-printed JSON document.
///
/// Writes go to a sibling temp file which is fsynced and renamed over the
/// target, so a killed process leaves either the old or the new file.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> StateError {
        StateError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl StateStore for JsonStateStore {
    fn name(&self) -> &str {
        "json_file"
    }

    fn load(&self) -> Result<HealthState, StateError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No state file yet, starting with empty state");
                return Ok(HealthState::new());
            }
            Err(e) => return Err(self.io_error(&self.path, e)),
        };

        let state: HealthState =
            serde_json::from_str(&contents).map_err(|e| StateError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        info!(
            path = %self.path.display(),
            "Loaded state for {} torrents",
            state.len()
        );
        Ok(state)
    }

    fn save(&self, state: &HealthState) -> Result<(), StateError> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| StateError::Serialize(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
        }

        let tmp_path = self.tmp_path();
        let mut file = fs::File::create(&tmp_path).map_err(|e| self.io_error(&tmp_path, e))?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| self.io_error(&tmp_path, e))?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            self.io_error(&self.path, e)
        })?;

        debug!(
            path = %self.path.display(),
            "Saved state for {} torrents",
            state.len()
        );
        Ok(())
    }
}
