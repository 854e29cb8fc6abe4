use std::sync::Arc;

use tokio::sync::RwLock;

use swarmwatch_core::{Config, CycleReport, SanitizedConfig, StateStore};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn StateStore>,
    last_report: RwLock<Option<CycleReport>>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn StateStore>) -> Self {
        Self {
            config,
            store,
            last_report: RwLock::new(None),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> Arc<dyn StateStore> {
        Arc::clone(&self.store)
    }

    /// Report of the most recent cycle that ran to completion or was interrupted.
    pub async fn last_report(&self) -> Option<CycleReport> {
        self.last_report.read().await.clone()
    }

    pub async fn set_last_report(&self, report: CycleReport) {
        *self.last_report.write().await = Some(report);
    }
}
