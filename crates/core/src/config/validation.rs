//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `cache_version` or `precache` is empty, and
    /// `ConfigError::Invalid` if:
    /// - `cache_version` contains whitespace
    /// - `origin` is not an http(s) URL
    /// - `api_prefix` or `sync_endpoint` is neither absolute path nor URL
    /// - `timeout_ms` or `dispatch_timeout_ms` is outside 100ms..=5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_version.is_empty() {
            return Err(ConfigError::Missing {
                field: "cache_version".into(),
                hint: "Set SHOWROOM_CACHE_VERSION, e.g. v1".into(),
            });
        }
        if self.cache_version.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                field: "cache_version".into(),
                reason: "must not contain whitespace".into(),
            });
        }

        if !(self.origin.starts_with("http://") || self.origin.starts_with("https://")) {
            return Err(ConfigError::Invalid { field: "origin".into(), reason: "must be an http(s) URL".into() });
        }

        if self.precache.is_empty() {
            return Err(ConfigError::Missing {
                field: "precache".into(),
                hint: "list at least the root document".into(),
            });
        }

        if !self.api_prefix.starts_with('/') {
            return Err(ConfigError::Invalid { field: "api_prefix".into(), reason: "must start with '/'".into() });
        }

        if !(self.sync_endpoint.starts_with('/') || self.sync_endpoint.contains("://")) {
            return Err(ConfigError::Invalid {
                field: "sync_endpoint".into(),
                reason: "must be an absolute path or URL".into(),
            });
        }

        for (field, value) in [("timeout_ms", self.timeout_ms), ("dispatch_timeout_ms", self.dispatch_timeout_ms)] {
            if value < 100 {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must be at least 100ms".into() });
            }
            if value > 300_000 {
                return Err(ConfigError::Invalid {
                    field: field.into(),
                    reason: "must not exceed 5 minutes (300000ms)".into(),
                });
            }
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if !self.worker_enabled {
            tracing::warn!("worker_enabled is false; compute tasks will run inline");
        }

        Ok(())
    }
}
