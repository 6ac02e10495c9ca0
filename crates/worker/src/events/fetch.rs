//! Fetch interception and the two caching strategies.
//!
//! ### Cache-first
//! - Any store hit is returned without touching the network.
//! - Otherwise fetch; 2xx responses are copied into the static store.
//!
//! ### Network-first
//! - Fetch; 2xx responses are copied into the dynamic store.
//! - On network failure, fall back to any cached copy.
//!
//! Both strategies serve the cached offline page to failed navigations and
//! otherwise return the network error. Non-2xx responses are passed
//! through untouched: never cached, never replaced by a cached copy.

use folio_client::{Network, same_origin};
use folio_core::{CachedResponse, Error, Request, RequestKey, Strategy};
use serde::Serialize;

use crate::handler::{OfflineWorker, WorkerState};

/// Why a request was left to the network untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassReason {
    /// The worker is not controlling pages yet.
    NotActive,
    NonGet,
    CrossOrigin,
}

/// What the worker did with an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDisposition {
    /// Not intercepted; the page's request goes out unmodified.
    PassThrough(PassReason),
    /// Answered by the worker.
    Respond(CachedResponse),
}

impl<N: Network> OfflineWorker<N> {
    /// Handle one outgoing request from a page.
    ///
    /// # Errors
    ///
    /// Returns the network error when neither the network nor the cache
    /// could answer.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchDisposition, Error> {
        if self.state().await != WorkerState::Activated {
            return Ok(FetchDisposition::PassThrough(PassReason::NotActive));
        }
        if !request.is_get() {
            return Ok(FetchDisposition::PassThrough(PassReason::NonGet));
        }
        if !same_origin(&request.url, &self.origin) {
            return Ok(FetchDisposition::PassThrough(PassReason::CrossOrigin));
        }

        let class = self.config.routes.classify(request.url.path());
        tracing::debug!(url = %request.url, ?class, "intercepted");

        let response = match class.strategy() {
            Strategy::CacheFirst => self.cache_first(request).await?,
            Strategy::NetworkFirst => self.network_first(request).await?,
        };
        Ok(FetchDisposition::Respond(response))
    }

    /// Serve from any store, else from the network, caching 2xx responses
    /// in the static store.
    pub async fn cache_first(&self, request: &Request) -> Result<CachedResponse, Error> {
        let key = self.key_for(request);
        match self.cache_then_network(request, &key).await {
            Ok(response) => Ok(response),
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "cache first failed");
                self.navigation_fallback(request, err).await
            }
        }
    }

    async fn cache_then_network(&self, request: &Request, key: &RequestKey) -> Result<CachedResponse, Error> {
        if let Some(cached) = self.db.match_any(key).await? {
            tracing::debug!(url = %request.url, "cache hit");
            return Ok(cached);
        }

        let response = self.network_fetch(request).await?;
        if response.is_ok() {
            self.store_copy(&self.names.static_store, key, &response).await;
        }
        Ok(response)
    }

    /// Serve from the network, caching 2xx responses in the dynamic store;
    /// fall back to any store when the network fails.
    pub async fn network_first(&self, request: &Request) -> Result<CachedResponse, Error> {
        let key = self.key_for(request);
        match self.network_fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store_copy(&self.names.dynamic_store, &key, &response).await;
                }
                Ok(response)
            }
            Err(err) => {
                tracing::debug!(url = %request.url, error = %err, "network first failed, trying cache");
                match self.db.match_any(&key).await {
                    Ok(Some(cached)) => return Ok(cached),
                    Ok(None) => {}
                    Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed"),
                }
                self.navigation_fallback(request, err).await
            }
        }
    }

    /// For navigations, the cached offline page; otherwise `err`.
    ///
    /// `err` is what the caller sees whenever no offline page can be served.
    async fn navigation_fallback(&self, request: &Request, err: Error) -> Result<CachedResponse, Error> {
        if !request.is_navigation() {
            return Err(err);
        }
        let fallback = self.request_for_path(&self.config.offline_fallback_path)?;
        match self.db.match_any(&self.key_for(&fallback)).await {
            Ok(Some(page)) => {
                tracing::debug!(url = %request.url, fallback = %fallback.url, "serving offline page");
                Ok(page)
            }
            Ok(None) => Err(err),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "offline page lookup failed");
                Err(err)
            }
        }
    }
}
