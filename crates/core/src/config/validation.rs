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
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `origin` is not an http(s) URL with a host
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - a store name component or the sync tag is empty
    /// - `max_sync_attempts` is 0
    /// - a route path or prefix does not start with `/`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let origin = self.origin_url()?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(invalid("origin", "scheme must be http or https"));
        }
        if origin.host_str().is_none() {
            return Err(invalid("origin", "must include a host"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.cache_prefix.trim().is_empty() {
            return Err(invalid("cache_prefix", "must not be empty"));
        }
        if self.cache_version.trim().is_empty() {
            return Err(invalid("cache_version", "must not be empty"));
        }
        if self.sync_tag.trim().is_empty() {
            return Err(invalid("sync_tag", "must not be empty"));
        }
        if self.max_sync_attempts == 0 {
            return Err(invalid("max_sync_attempts", "must be at least 1"));
        }
        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        for (field, path) in [
            ("offline_fallback_path", &self.offline_fallback_path),
            ("relay_path", &self.relay_path),
            ("routes.api_prefix", &self.routes.api_prefix),
        ] {
            if !path.starts_with('/') {
                return Err(invalid(field, "must start with '/'"));
            }
        }
        if self.routes.static_paths.iter().any(|p| !p.starts_with('/')) {
            return Err(invalid("routes.static_paths", "every path must start with '/'"));
        }
        if self.routes.asset_prefixes.iter().any(|p| !p.starts_with('/')) {
            return Err(invalid("routes.asset_prefixes", "every prefix must start with '/'"));
        }

        let shadowed: Vec<&str> = self
            .routes
            .static_paths
            .iter()
            .filter(|p| p.starts_with(self.routes.api_prefix.as_str()))
            .map(String::as_str)
            .collect();
        if !shadowed.is_empty() {
            tracing::warn!(
                paths = ?shadowed,
                api_prefix = %self.routes.api_prefix,
                "static paths fall under the API prefix; they will be served cache-first"
            );
        }

        Ok(())
    }
}
