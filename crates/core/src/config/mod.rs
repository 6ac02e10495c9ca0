//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FOLIO_SW_*)
//! 2. TOML config file (if FOLIO_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::routes::RouteTable;

mod validation;

pub use validation::ConfigError;

/// How the static manifest is populated on install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecachePolicy {
    /// Any failed asset fails the whole install and nothing is stored.
    #[default]
    AllOrNothing,
    /// Store every asset that could be fetched, report the rest.
    BestEffort,
}

/// Names of the two stores owned by the current version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    pub static_store: String,
    pub dynamic_store: String,
}

impl CacheNames {
    /// Whether `name` belongs to the current version.
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_store || name == self.dynamic_store
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FOLIO_SW_*)
/// 2. TOML config file (if FOLIO_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin of the site whose requests are intercepted.
    ///
    /// Set via FOLIO_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix shared by every store name.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version tag appended to store names. Bumping it retires old stores
    /// on the next activation.
    ///
    /// Set via FOLIO_SW_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Path to SQLite cache database.
    ///
    /// Set via FOLIO_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network deadline in milliseconds.
    ///
    /// Set via FOLIO_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Install-time population policy.
    #[serde(default)]
    pub precache_policy: PrecachePolicy,

    /// Cached page served to navigations that fail with no cached copy.
    #[serde(default = "default_offline_fallback_path")]
    pub offline_fallback_path: String,

    /// Path that queued contact submissions are replayed to.
    #[serde(default = "default_relay_path")]
    pub relay_path: String,

    /// Background sync tag that triggers submission replay.
    #[serde(default = "default_sync_tag")]
    pub sync_tag: String,

    /// Replays a submission may fail on relay errors before it is dropped.
    /// Attempts that never reached the relay do not count against it.
    ///
    /// Set via FOLIO_SW_MAX_SYNC_ATTEMPTS environment variable.
    #[serde(default = "default_max_sync_attempts")]
    pub max_sync_attempts: u32,

    /// Request headers that take part in the cache key.
    ///
    /// Set via FOLIO_SW_VARY_HEADERS environment variable (e.g. `[accept]`).
    #[serde(default)]
    pub vary_headers: Vec<String>,

    /// Route classification table.
    #[serde(default)]
    pub routes: RouteTable,
}

fn default_origin() -> String {
    "http://localhost:3000".into()
}

fn default_cache_prefix() -> String {
    "portfolio".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./folio-sw-cache.sqlite")
}

fn default_user_agent() -> String {
    "folio-sw/0.1".into()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_offline_fallback_path() -> String {
    "/".into()
}

fn default_relay_path() -> String {
    "/api/contact".into()
}

fn default_sync_tag() -> String {
    "contact-form-sync".into()
}

fn default_max_sync_attempts() -> u32 {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            precache_policy: PrecachePolicy::default(),
            offline_fallback_path: default_offline_fallback_path(),
            relay_path: default_relay_path(),
            sync_tag: default_sync_tag(),
            max_sync_attempts: default_max_sync_attempts(),
            vary_headers: Vec::new(),
            routes: RouteTable::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Version-tagged names of the static and dynamic stores.
    pub fn cache_names(&self) -> CacheNames {
        CacheNames {
            static_store: format!("{}-static-{}", self.cache_prefix, self.cache_version),
            dynamic_store: format!("{}-dynamic-{}", self.cache_prefix, self.cache_version),
        }
    }

    /// Parsed site origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the origin is not a URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FOLIO_SW_`
    /// 2. TOML file from `FOLIO_SW_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("FOLIO_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FOLIO_SW_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
