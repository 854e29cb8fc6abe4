//! In-memory state store for testing.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::state::{HealthState, StateError, StateStore};

/// State store that keeps the last saved state in memory.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<HealthState>,
    saves: AtomicUsize,
    /// When set, `load` fails as if the backing file were corrupt.
    corrupt: AtomicBool,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state.
    pub fn with_state(state: HealthState) -> Self {
        Self {
            state: Mutex::new(state),
            ..Self::default()
        }
    }

    /// The last saved (or initial) state.
    pub fn snapshot(&self) -> HealthState {
        self.lock().clone()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn set_corrupt(&self, corrupt: bool) {
        self.corrupt.store(corrupt, Ordering::SeqCst);
    }

    fn lock(&self) -> MutexGuard<'_, HealthState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StateStore for MemoryStateStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self) -> Result<HealthState, StateError> {
        if self.corrupt.load(Ordering::SeqCst) {
            return Err(StateError::Corrupt {
                path: PathBuf::from("memory"),
                reason: "simulated corruption".to_string(),
            });
        }
        Ok(self.snapshot())
    }

    fn save(&self, state: &HealthState) -> Result<(), StateError> {
        *self.lock() = state.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
