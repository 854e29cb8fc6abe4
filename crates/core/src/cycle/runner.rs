//! Check cycle implementation.
//!
//! One cycle: load state, list torrents, select the due ones, then for each
//! due torrent fetch its seeder count, classify it, plan and apply actions,
//! and record the check. State is saved once at the end. Torrents are
//! processed one at a time.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::health::{classify, plan, select_due, Action, Classification};
use crate::metrics::{
    set_distribution, ACTIONS_TOTAL, CYCLES_TOTAL, CYCLE_DURATION, TORRENTS_CHECKED,
    TORRENT_CHECK_FAILURES,
};
use crate::state::{HealthState, StateStore};
use crate::torrent_client::{TorrentClient, TorrentClientError, TorrentInfo};

use super::types::{
    CycleError, CycleReport, CycleSettings, CycleSummary, FailureStage, TorrentFailure,
};

/// Runs health check cycles against a torrent client.
pub struct CycleRunner {
    client: Arc<dyn TorrentClient>,
    store: Arc<dyn StateStore>,
    settings: CycleSettings,
    shutdown: Arc<AtomicBool>,
}

impl CycleRunner {
    pub fn new(
        client: Arc<dyn TorrentClient>,
        store: Arc<dyn StateStore>,
        settings: CycleSettings,
    ) -> Self {
        Self {
            client,
            store,
            settings,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a shutdown flag with the caller.
    ///
    /// Once set, the running cycle stops before its next torrent, saves what
    /// it has and returns an interrupted report.
    pub fn with_shutdown_flag(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run one full cycle evaluated against `now`.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport, CycleError> {
        let started = Instant::now();
        let result = self.execute(now).await;

        let label = match &result {
            Ok(report) if report.interrupted => "interrupted",
            Ok(_) => "completed",
            Err(e) => e.kind(),
        };
        CYCLES_TOTAL.with_label_values(&[label]).inc();
        CYCLE_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    async fn execute(&self, now: DateTime<Utc>) -> Result<CycleReport, CycleError> {
        info!(
            check_interval_hours = self.settings.check_interval.num_hours(),
            client = self.client.name(),
            store = self.store.name(),
            "Starting check cycle at {}",
            now
        );

        let mut state = self.store.load().map_err(|e| {
            error!("Failed to load health state, aborting cycle: {}", e);
            e
        })?;

        let torrents = self
            .call(self.client.list_torrents())
            .await
            .map_err(|e| {
                let err = CycleError::from(e);
                warn!(kind = err.kind(), "Failed to retrieve torrent list, will retry next cycle: {}", err);
                err
            })?;

        let due: BTreeSet<&str> = select_due(
            torrents.iter().map(|t| t.hash.as_str()),
            &state,
            self.settings.check_interval,
            now,
        )
        .into_iter()
        .collect();

        let mut summary = CycleSummary {
            total_torrents: torrents.len(),
            due_torrents: due.len(),
            ..Default::default()
        };
        let mut failures = Vec::new();
        let mut interrupted = false;

        info!(
            "Found {} torrents: {} due for check, {} checked recently",
            summary.total_torrents,
            summary.due_torrents,
            summary.total_torrents - summary.due_torrents
        );

        for torrent in torrents.iter().filter(|t| due.contains(t.hash.as_str())) {
            if self.shutdown.load(Ordering::Relaxed) {
                info!("Shutdown requested, stopping cycle early");
                interrupted = true;
                break;
            }

            self.check_torrent(torrent, &mut state, now, &mut summary, &mut failures)
                .await;
        }

        if summary.checked > 0 {
            self.store.save(&state).map_err(|e| {
                error!("Failed to save health state: {}", e);
                e
            })?;
        }

        summary.distribution = state.distribution(torrents.iter().map(|t| t.hash.as_str()));
        set_distribution(&summary.distribution);

        info!(
            checked = summary.checked,
            skipped = summary.skipped,
            actions_applied = summary.actions_applied,
            actions_failed = summary.actions_failed,
            interrupted,
            "Cycle finished. This run: {}. All tracked: {}",
            summary.checked_distribution,
            summary.distribution
        );

        Ok(CycleReport {
            started_at: now,
            finished_at: Utc::now(),
            interrupted,
            summary,
            failures,
        })
    }

    /// Check one due torrent, updating `state` only if its seeder count was fetched.
    async fn check_torrent(
        &self,
        torrent: &TorrentInfo,
        state: &mut HealthState,
        now: DateTime<Utc>,
        summary: &mut CycleSummary,
        failures: &mut Vec<TorrentFailure>,
    ) {
        let seeders = match self.call(self.client.seeder_count(torrent)).await {
            Ok(seeders) => seeders,
            Err(e) => {
                warn!(hash = %torrent.hash, "Skipping {}: failed to fetch seeders: {}", torrent.name, e);
                TORRENT_CHECK_FAILURES.inc();
                summary.skipped += 1;
                failures.push(TorrentFailure {
                    hash: torrent.hash.clone(),
                    name: torrent.name.clone(),
                    stage: FailureStage::Fetch,
                    error: e.to_string(),
                });
                return;
            }
        };

        let classification = classify(i64::from(seeders), &self.settings.thresholds);
        match classification {
            Classification::Critical | Classification::Rare => {
                info!(hash = %torrent.hash, seeders, "{} [{} seeds]: {}", classification, seeders, torrent.name)
            }
            Classification::Low => {
                debug!(hash = %torrent.hash, seeders, "LOW [{} seeds]: {}", seeders, torrent.name)
            }
            Classification::Healthy => {}
        }

        // The check itself succeeded; failed actions are retried when next due.
        state.record_check(&torrent.hash, &torrent.name, seeders, classification, now);
        summary.checked += 1;
        summary.checked_distribution.add(Some(classification));
        TORRENTS_CHECKED
            .with_label_values(&[classification.as_str()])
            .inc();

        let actions = plan(
            classification,
            torrent.is_paused,
            torrent.is_queued,
            &self.settings.policy,
        );

        for action in actions {
            let result = match action {
                Action::Resume => self.call(self.client.resume_torrent(&torrent.hash)).await,
                Action::BoostPriority => {
                    self.call(self.client.boost_priority(&torrent.hash, classification))
                        .await
                }
            };

            match result {
                Ok(()) => {
                    info!(hash = %torrent.hash, action = action.as_str(), "Applied {} to {}", action.as_str(), torrent.name);
                    ACTIONS_TOTAL
                        .with_label_values(&[action.as_str(), "success"])
                        .inc();
                    summary.actions_applied += 1;
                }
                Err(e) => {
                    warn!(hash = %torrent.hash, action = action.as_str(), "Failed to apply {} to {}: {}", action.as_str(), torrent.name, e);
                    ACTIONS_TOTAL
                        .with_label_values(&[action.as_str(), "error"])
                        .inc();
                    summary.actions_failed += 1;
                    failures.push(TorrentFailure {
                        hash: torrent.hash.clone(),
                        name: torrent.name.clone(),
                        stage: FailureStage::Action(action),
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    /// Bound a client call by the cycle's call timeout.
    async fn call<T, F>(&self, fut: F) -> Result<T, TorrentClientError>
    where
        F: Future<Output = Result<T, TorrentClientError>>,
    {
        tokio::time::timeout(self.settings.call_timeout, fut)
            .await
            .unwrap_or_else(|_| Err(TorrentClientError::Timeout))
    }
}
