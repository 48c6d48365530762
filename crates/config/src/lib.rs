use std::path::Path;

use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "SOFTDESK_CONFIG";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://softdesk.sqlite?mode=rwc";
const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60 * 24;
pub const MAX_TOKEN_TTL_SECS: i64 = 60 * 60 * 24 * 365;
const GENERATED_SECRET_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    ValidationError(String),
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

impl AuthConfig {
    /// Fills an unset secret with a random one that only lives as long as the
    /// process. Returns whether a secret was generated.
    pub fn ensure_secret(&mut self) -> bool {
        if !self.jwt_secret.is_empty() {
            return false;
        }
        self.jwt_secret = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(GENERATED_SECRET_LEN)
            .map(char::from)
            .collect();
        true
    }
}

impl Config {
    /// Parses a raw JSON config, falling back to defaults when it is unreadable.
    pub fn from_raw(raw: &str) -> Self {
        match serde_json::from_str::<Config>(raw) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Invalid config file, using defaults: {}", err);
                Config::default()
            }
        }
    }

    /// Applies `HOST`, `PORT`/`BACKEND_PORT`, `DATABASE_URL`, `JWT_SECRET` and
    /// `JWT_TTL_SECS` overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(host) = read("HOST") {
            self.host = host;
        }
        if let Some(raw) = read("BACKEND_PORT").or_else(|| read("PORT")) {
            match raw.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(err) => tracing::warn!(value = %raw, error = %err, "Invalid PORT; ignoring"),
            }
        }
        if let Some(url) = read("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(secret) = read("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(raw) = read("JWT_TTL_SECS") {
            match raw.parse::<i64>() {
                Ok(ttl) => self.auth.token_ttl_secs = ttl,
                Err(err) => {
                    tracing::warn!(value = %raw, error = %err, "Invalid JWT_TTL_SECS; ignoring")
                }
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database_url must not be empty".to_string(),
            ));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }
        if self.auth.token_ttl_secs <= 0 || self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::ValidationError(format!(
                "auth.token_ttl_secs must be between 1 and {MAX_TOKEN_TTL_SECS}"
            )));
        }
        Ok(())
    }
}

/// Will always return config, falling back to defaults on missing/invalid files.
pub fn load_config_from_file(config_path: &Path) -> Config {
    match std::fs::read_to_string(config_path) {
        Ok(raw_config) => Config::from_raw(&raw_config),
        Err(err) => {
            if err.kind() == std::io::ErrorKind::NotFound {
                tracing::info!("No config file at {}, using defaults", config_path.display());
            } else {
                tracing::warn!("Failed to read config file: {}", err);
            }
            Config::default()
        }
    }
}

/// Loads the file named by `SOFTDESK_CONFIG` (if any), applies environment
/// overrides and validates the result.
pub fn load_from_env() -> Result<Config, ConfigError> {
    let config = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => load_config_from_file(Path::new(path.trim())),
        _ => Config::default(),
    };
    let mut config = config.with_env_overrides(|name| std::env::var(name).ok());
    if config.auth.ensure_secret() {
        tracing::warn!("JWT_SECRET is not set; tokens are signed with a random per-process secret");
    }
    config.validate()?;
    Ok(config)
}
