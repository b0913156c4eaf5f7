//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHOWROOM_*)
//! 2. TOML config file (if SHOWROOM_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHOWROOM_*)
/// 2. TOML config file (if SHOWROOM_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version tag prefixed to every named cache (`{version}-static`, ...).
    ///
    /// Bumping it makes activation delete every cache from older versions.
    /// Set via SHOWROOM_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Path to SQLite cache database.
    ///
    /// Set via SHOWROOM_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Site origin that relative paths (pre-cache list, sync endpoint) resolve against.
    ///
    /// Set via SHOWROOM_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Critical assets stored in the static cache during install.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Path prefix identifying API requests.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Endpoint receiving queued favorites during background sync.
    ///
    /// Set via SHOWROOM_SYNC_ENDPOINT environment variable.
    #[serde(default = "default_sync_endpoint")]
    pub sync_endpoint: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SHOWROOM_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHOWROOM_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Per-task timeout for the background compute dispatcher in milliseconds.
    ///
    /// Set via SHOWROOM_DISPATCH_TIMEOUT_MS environment variable.
    #[serde(default = "default_dispatch_timeout_ms")]
    pub dispatch_timeout_ms: u64,

    /// Whether compute tasks may run on a background context.
    ///
    /// When false every task runs inline on the caller.
    /// Set via SHOWROOM_WORKER_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub worker_enabled: bool,
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./showroom-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_precache() -> Vec<String> {
    vec!["/".into(), "/static/js/bundle.js".into(), "/static/css/main.css".into(), "/manifest.json".into()]
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_sync_endpoint() -> String {
    "/api/favorites/sync".into()
}

fn default_user_agent() -> String {
    "showroom/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_dispatch_timeout_ms() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_version: default_cache_version(),
            db_path: default_db_path(),
            origin: default_origin(),
            precache: default_precache(),
            api_prefix: default_api_prefix(),
            sync_endpoint: default_sync_endpoint(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            dispatch_timeout_ms: default_dispatch_timeout_ms(),
            worker_enabled: true,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Dispatcher per-task timeout as Duration.
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.dispatch_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHOWROOM_`
    /// 2. TOML file from `SHOWROOM_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHOWROOM_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHOWROOM_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.cache_version, "v1");
        assert_eq!(config.db_path, PathBuf::from("./showroom-cache.sqlite"));
        assert_eq!(config.origin, "http://localhost:3000");
        assert_eq!(config.precache.len(), 4);
        assert_eq!(config.precache[0], "/");
        assert_eq!(config.api_prefix, "/api/");
        assert_eq!(config.sync_endpoint, "/api/favorites/sync");
        assert_eq!(config.user_agent, "showroom/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.dispatch_timeout_ms, 30_000);
        assert!(config.worker_enabled);
    }

    #[test]
    fn test_timeout_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.dispatch_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::string(
            r#"
            cache_version = "v7"
            worker_enabled = false
            "#,
        ));
        let config: AppConfig = figment.extract().unwrap();
        assert_eq!(config.cache_version, "v7");
        assert!(!config.worker_enabled);
        assert_eq!(config.api_prefix, "/api/");
    }
}
