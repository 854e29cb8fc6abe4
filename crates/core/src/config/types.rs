use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::health::{ActionPolicy, Thresholds};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub qbittorrent: QBittorrentConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub actions: ActionPolicy,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// qBittorrent Web UI connection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web UI URL (e.g., "http://localhost:6767")
    #[serde(default = "default_qbittorrent_url")]
    pub url: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    /// Per-request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for QBittorrentConfig {
    fn default() -> Self {
        Self {
            url: default_qbittorrent_url(),
            username: default_username(),
            password: default_password(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_qbittorrent_url() -> String {
    "http://localhost:6767".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "adminadmin".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Check and run cadence
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// Days between health checks of the same torrent.
    #[serde(default = "default_check_interval_days")]
    pub check_interval_days: f64,
    /// Hours between check cycles.
    #[serde(default = "default_run_interval_hours")]
    pub run_interval_hours: f64,
    /// Seconds to wait before the first cycle so the torrent client can come up.
    #[serde(default = "default_startup_delay")]
    pub startup_delay_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            check_interval_days: default_check_interval_days(),
            run_interval_hours: default_run_interval_hours(),
            startup_delay_secs: default_startup_delay(),
        }
    }
}

fn default_check_interval_days() -> f64 {
    30.0
}

fn default_run_interval_hours() -> f64 {
    24.0
}

fn default_startup_delay() -> u64 {
    60
}

/// State file configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateConfig {
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_state_path() -> PathBuf {
    PathBuf::from("/config/state.json")
}

/// Read-only status HTTP server
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    9797
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub qbittorrent: SanitizedQBittorrentConfig,
    pub schedule: ScheduleConfig,
    pub thresholds: Thresholds,
    pub actions: ActionPolicy,
    pub state: StateConfig,
    pub http: HttpConfig,
}

/// Sanitized qBittorrent config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedQBittorrentConfig {
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            qbittorrent: SanitizedQBittorrentConfig {
                url: config.qbittorrent.url.clone(),
                username: config.qbittorrent.username.clone(),
                password_configured: !config.qbittorrent.password.is_empty(),
                timeout_secs: config.qbittorrent.timeout_secs,
            },
            schedule: config.schedule.clone(),
            thresholds: config.thresholds,
            actions: config.actions,
            state: config.state.clone(),
            http: config.http.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.qbittorrent.url, "http://localhost:6767");
        assert_eq!(config.qbittorrent.username, "admin");
        assert_eq!(config.qbittorrent.timeout_secs, 30);
        assert_eq!(config.schedule.check_interval_days, 30.0);
        assert_eq!(config.schedule.run_interval_hours, 24.0);
        assert_eq!(config.schedule.startup_delay_secs, 60);
        assert_eq!(config.thresholds, Thresholds::new(1, 2, 5));
        assert!(config.actions.resume_critical);
        assert!(!config.actions.resume_rare);
        assert!(config.actions.set_priorities);
        assert_eq!(config.state.path.to_str().unwrap(), "/config/state.json");
        assert!(!config.http.enabled);
        assert_eq!(config.http.port, 9797);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
[qbittorrent]
url = "http://qbit:8080"
username = "seeder"
password = "hunter2"
timeout_secs = 10

[schedule]
check_interval_days = 7.5
run_interval_hours = 6
startup_delay_secs = 0

[thresholds]
critical_seeders = 2
rare_seeders = 5
low_seeders = 10

[actions]
resume_critical = false
resume_rare = true
set_priorities = false

[state]
path = "/data/state.json"

[http]
enabled = true
host = "127.0.0.1"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.qbittorrent.url, "http://qbit:8080");
        assert_eq!(config.qbittorrent.timeout_secs, 10);
        assert_eq!(config.schedule.check_interval_days, 7.5);
        assert_eq!(config.schedule.run_interval_hours, 6.0);
        assert_eq!(config.thresholds, Thresholds::new(2, 5, 10));
        assert!(!config.actions.resume_critical);
        assert!(config.actions.resume_rare);
        assert_eq!(config.state.path.to_str().unwrap(), "/data/state.json");
        assert!(config.http.enabled);
        assert_eq!(config.http.host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_sanitized_config_hides_password() {
        let config = Config::default();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.qbittorrent.password_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("adminadmin"));
    }

    #[test]
    fn test_sanitized_config_empty_password() {
        let mut config = Config::default();
        config.qbittorrent.password.clear();
        let sanitized = SanitizedConfig::from(&config);
        assert!(!sanitized.qbittorrent.password_configured);
    }
}
