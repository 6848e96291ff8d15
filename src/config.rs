//! Application-level configuration: JSON tunables plus deployment settings read from the environment.

use std::{env, fmt, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CHESS_LINK_CONFIG_PATH";

const DATABASE_URL_ENV: &str = "DATABASE_URL";
const ANON_KEY_ENV: &str = "DATABASE_ANON_KEY";
const SERVICE_ROLE_KEY_ENV: &str = "DATABASE_SERVICE_ROLE_KEY";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MOVE_RETRY_LIMIT: u32 = 3;
const DEFAULT_FEED_CAPACITY: usize = 32;
const DEFAULT_TABLE: &str = "games";

/// Errors raised while reading deployment settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A key variable is unset.
    #[error("`{var}` is required when `DATABASE_URL` is set")]
    MissingEnvVar { var: &'static str },
    /// A key variable is set but blank.
    #[error("`{var}` must not be empty")]
    EmptyEnvVar { var: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// How many times a move is re-validated after losing a concurrent write.
    pub move_retry_limit: u32,
    /// Buffered events per game feed before slow subscribers start lagging.
    pub feed_capacity: usize,
    /// Name of the table holding game records.
    pub table: String,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        move_retry_limit = app_config.move_retry_limit,
                        feed_capacity = app_config.feed_capacity,
                        table = %app_config.table,
                        "loaded tunables from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            move_retry_limit: DEFAULT_MOVE_RETRY_LIMIT,
            feed_capacity: DEFAULT_FEED_CAPACITY,
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    move_retry_limit: Option<u32>,
    feed_capacity: Option<usize>,
    table: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            move_retry_limit: value.move_retry_limit.unwrap_or(defaults.move_retry_limit),
            // A zero-capacity broadcast channel panics on creation.
            feed_capacity: value
                .feed_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.feed_capacity),
            table: value
                .table
                .filter(|table| !table.trim().is_empty())
                .unwrap_or(defaults.table),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Port the HTTP server binds to (`PORT`, then `SERVER_PORT`, then 8080).
pub fn server_port() -> u16 {
    env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Secret credential whose value never shows up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw key, for building request headers only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Connection settings for the hosted database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Project URL, without the `/rest/v1` suffix.
    pub url: String,
    /// Public key, constrained by row-level security.
    pub anon_key: ApiKey,
    /// Privileged key used for every write.
    pub service_role_key: ApiKey,
}

impl DatabaseSettings {
    /// Read the settings from the process environment.
    ///
    /// Returns `Ok(None)` when no database URL is configured.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        let Some(url) = lookup(DATABASE_URL_ENV) else {
            return Ok(None);
        };
        let url = url.trim().trim_end_matches('/').to_string();
        if url.is_empty() {
            return Ok(None);
        }

        let key = |var: &'static str| -> Result<ApiKey, ConfigError> {
            let value = lookup(var).ok_or(ConfigError::MissingEnvVar { var })?;
            let value = value.trim();
            if value.is_empty() {
                return Err(ConfigError::EmptyEnvVar { var });
            }
            Ok(ApiKey::new(value))
        };

        Ok(Some(Self {
            url,
            anon_key: key(ANON_KEY_ENV)?,
            service_role_key: key(SERVICE_ROLE_KEY_ENV)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn raw_config_fills_missing_fields_with_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{ "move_retry_limit": 5 }"#).unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.move_retry_limit, 5);
        assert_eq!(config.feed_capacity, DEFAULT_FEED_CAPACITY);
        assert_eq!(config.table, DEFAULT_TABLE);
    }

    #[test]
    fn zero_feed_capacity_is_ignored() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "feed_capacity": 0, "table": " " }"#).unwrap();
        let config = AppConfig::from(raw);

        assert_eq!(config.feed_capacity, DEFAULT_FEED_CAPACITY);
        assert_eq!(config.table, DEFAULT_TABLE);
    }

    #[test]
    fn no_database_url_means_no_settings() {
        assert_eq!(DatabaseSettings::from_lookup(lookup(&[])), Ok(None));
    }

    #[test]
    fn service_role_key_is_mandatory() {
        let result = DatabaseSettings::from_lookup(lookup(&[
            (DATABASE_URL_ENV, "https://example.test/"),
            (ANON_KEY_ENV, "anon"),
        ]));

        assert_eq!(
            result,
            Err(ConfigError::MissingEnvVar {
                var: SERVICE_ROLE_KEY_ENV
            })
        );
    }

    #[test]
    fn settings_keep_both_keys_apart() {
        let settings = DatabaseSettings::from_lookup(lookup(&[
            (DATABASE_URL_ENV, "https://example.test/"),
            (ANON_KEY_ENV, "anon"),
            (SERVICE_ROLE_KEY_ENV, "service"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(settings.url, "https://example.test");
        assert_eq!(settings.anon_key.expose(), "anon");
        assert_eq!(settings.service_role_key.expose(), "service");
        assert!(!format!("{settings:?}").contains("service\""));
    }
}
