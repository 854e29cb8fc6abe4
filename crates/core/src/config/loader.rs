use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `SWARMWATCH_THRESHOLDS__CRITICAL_SEEDERS`.
pub const ENV_PREFIX: &str = "SWARMWATCH_";

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX)
        .ignore(&["CONFIG", "LOG_FORMAT"])
        .split("__")
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from defaults and environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(env_provider())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[thresholds]
critical_seeders = 0
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.thresholds.critical_seeders, 0);
        assert_eq!(config.thresholds.rare_seeders, 2);
    }

    #[test]
    fn test_load_config_from_str_bad_type() {
        let toml = r#"
[thresholds]
critical_seeders = "one"
"#;
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/swarmwatch.toml"));
        assert!(matches!(result.unwrap_err(), ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[qbittorrent]
url = "http://127.0.0.1:8080"

[schedule]
check_interval_days = 14
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.qbittorrent.url, "http://127.0.0.1:8080");
        assert_eq!(config.schedule.check_interval_days, 14.0);
        assert_eq!(config.schedule.run_interval_hours, 24.0);
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "swarmwatch.toml",
                r#"
[thresholds]
critical_seeders = 1
rare_seeders = 3
"#,
            )?;
            jail.set_env("SWARMWATCH_THRESHOLDS__RARE_SEEDERS", "4");
            jail.set_env("SWARMWATCH_ACTIONS__RESUME_RARE", "true");

            let config = load_config(Path::new("swarmwatch.toml")).unwrap();
            assert_eq!(config.thresholds.critical_seeders, 1);
            assert_eq!(config.thresholds.rare_seeders, 4);
            assert!(config.actions.resume_rare);
            Ok(())
        });
    }

    #[test]
    fn test_load_config_from_env_only() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SWARMWATCH_QBITTORRENT__URL", "http://qbit:6767");
            jail.set_env("SWARMWATCH_STATE__PATH", "/tmp/state.json");
            jail.set_env("SWARMWATCH_CONFIG", "ignored.toml");

            let config = load_config_from_env().unwrap();
            assert_eq!(config.qbittorrent.url, "http://qbit:6767");
            assert_eq!(config.state.path.to_str().unwrap(), "/tmp/state.json");
            assert_eq!(config.schedule.check_interval_days, 30.0);
            Ok(())
        });
    }
}
