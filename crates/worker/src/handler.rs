//! The offline request cache.
//!
//! `OfflineWorker` owns the configuration, the cache storage and the
//! network, and tracks which lifecycle phase the current version is in.
//! Event handling lives in [`crate::events`].

use folio_client::Network;
use folio_core::{AppConfig, CacheDb, CacheNames, CachedResponse, Error, Request, RequestKey};
use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

/// Lifecycle phase of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Installation failed; this version never takes control.
    Redundant,
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    pub(crate) state: WorkerState,
    pub(crate) skip_waiting: bool,
    pub(crate) clients_claimed: bool,
}

/// Intercepts page requests and answers them from the cache or network.
pub struct OfflineWorker<N> {
    pub(crate) config: AppConfig,
    pub(crate) origin: Url,
    pub(crate) names: CacheNames,
    pub(crate) db: CacheDb,
    pub(crate) network: N,
    pub(crate) lifecycle: RwLock<Lifecycle>,
}

impl<N: Network> OfflineWorker<N> {
    /// Create a worker for one cache version.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the configured origin does not parse.
    pub fn new(config: AppConfig, db: CacheDb, network: N) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let names = config.cache_names();
        Ok(Self {
            config,
            origin,
            names,
            db,
            network,
            lifecycle: RwLock::new(Lifecycle {
                state: WorkerState::Parsed,
                skip_waiting: false,
                clients_claimed: false,
            }),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// The network, for requests the worker does not intercept.
    pub fn network(&self) -> &N {
        &self.network
    }

    pub async fn state(&self) -> WorkerState {
        self.lifecycle.read().await.state
    }

    /// Whether install asked to replace the previous version immediately.
    pub async fn skip_waiting(&self) -> bool {
        self.lifecycle.read().await.skip_waiting
    }

    /// Whether activation took control of open pages.
    pub async fn clients_claimed(&self) -> bool {
        self.lifecycle.read().await.clients_claimed
    }

    pub(crate) async fn set_state(&self, state: WorkerState) {
        let mut lifecycle = self.lifecycle.write().await;
        tracing::info!(from = ?lifecycle.state, to = ?state, version = %self.config.cache_version, "worker state change");
        lifecycle.state = state;
    }

    pub(crate) fn key_for(&self, request: &Request) -> RequestKey {
        RequestKey::for_request(request, &self.config.vary_headers)
    }

    /// A GET for a same-origin path.
    pub(crate) fn request_for_path(&self, path: &str) -> Result<Request, Error> {
        let url = self
            .origin
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
        Ok(Request::get(url))
    }

    /// Perform a network request under the configured deadline.
    pub(crate) async fn network_fetch(&self, request: &Request) -> Result<CachedResponse, Error> {
        let timeout = self.config.timeout();
        match tokio::time::timeout(timeout, self.network.fetch(request)).await {
            Ok(result) => result,
            Err(_) => Err(Error::FetchTimeout(format!("{} exceeded {}ms", request.url, timeout.as_millis()))),
        }
    }

    /// Write a copy of a network response into `store`.
    ///
    /// Failures are logged and swallowed; the caller still gets its response.
    pub(crate) async fn store_copy(&self, store: &str, key: &RequestKey, response: &CachedResponse) {
        if let Err(e) = self.db.put(store, key, response).await {
            tracing::warn!(store, url = %key.url, error = %e, "cache write failed");
        }
    }
}
