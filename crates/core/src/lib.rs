pub mod config;
pub mod cycle;
pub mod health;
pub mod metrics;
pub mod state;
pub mod testing;
pub mod torrent_client;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig,
};
pub use cycle::{
    CycleError, CycleReport, CycleRunner, CycleSettings, CycleSummary, FailureStage,
    TorrentFailure,
};
pub use health::{Action, ActionPolicy, Classification, Thresholds};
pub use state::{
    Distribution, HealthState, JsonStateStore, StateError, StateStore, TorrentHealthRecord,
};
pub use torrent_client::{QBittorrentClient, TorrentClient, TorrentClientError, TorrentInfo};
