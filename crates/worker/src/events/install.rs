//! Install: populate the static store with the shell manifest.

use folio_client::Network;
use folio_core::{CachedResponse, Error, PrecachePolicy, RequestKey};
use serde::Serialize;

use crate::error::WorkerError;
use crate::handler::{OfflineWorker, WorkerState};

/// An asset that could not be precached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedAsset {
    pub path: String,
    pub reason: String,
}

/// Outcome of a completed install.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub store: String,
    pub policy: PrecachePolicy,
    pub cached: Vec<String>,
    pub failed: Vec<FailedAsset>,
    pub skip_waiting: bool,
}

impl<N: Network> OfflineWorker<N> {
    /// Run the install phase.
    ///
    /// Under `AllOrNothing` any failed asset fails the install, leaves the
    /// static store empty and marks the worker redundant. Under
    /// `BestEffort` every fetched asset is kept and failures are reported.
    pub async fn install(&self) -> Result<InstallReport, WorkerError> {
        {
            let mut lifecycle = self.lifecycle.write().await;
            if !matches!(lifecycle.state, WorkerState::Parsed | WorkerState::Redundant) {
                return Err(WorkerError::InvalidState(format!("cannot install from {:?}", lifecycle.state)));
            }
            lifecycle.state = WorkerState::Installing;
        }
        tracing::info!(store = %self.names.static_store, policy = ?self.config.precache_policy, "installing");

        match self.precache().await {
            Ok((cached, failed)) => {
                {
                    let mut lifecycle = self.lifecycle.write().await;
                    lifecycle.skip_waiting = true;
                }
                self.set_state(WorkerState::Installed).await;
                Ok(InstallReport {
                    store: self.names.static_store.clone(),
                    policy: self.config.precache_policy,
                    cached,
                    failed,
                    skip_waiting: true,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "install failed");
                self.set_state(WorkerState::Redundant).await;
                Err(e.into())
            }
        }
    }

    async fn precache(&self) -> Result<(Vec<String>, Vec<FailedAsset>), Error> {
        let store = &self.names.static_store;
        self.db.open_store(store).await?;

        let mut fetched: Vec<(String, RequestKey, CachedResponse)> = Vec::new();
        let mut failed = Vec::new();
        for path in &self.config.routes.static_paths {
            let request = self.request_for_path(path)?;
            let reason = match self.network_fetch(&request).await {
                Ok(response) if response.is_ok() => {
                    fetched.push((path.clone(), self.key_for(&request), response));
                    continue;
                }
                Ok(response) => format!("status {}", response.status),
                Err(e) => e.to_string(),
            };
            tracing::debug!(path, %reason, "precache fetch failed");
            failed.push(FailedAsset { path: path.clone(), reason });
        }

        match self.config.precache_policy {
            PrecachePolicy::AllOrNothing => {
                if let Some(first) = failed.first() {
                    return Err(Error::PrecacheFailed(format!(
                        "{} of {} assets failed, first {}: {}",
                        failed.len(),
                        self.config.routes.static_paths.len(),
                        first.path,
                        first.reason
                    )));
                }
                let paths = fetched.iter().map(|(path, _, _)| path.clone()).collect();
                let entries = fetched.into_iter().map(|(_, key, response)| (key, response)).collect();
                self.db.put_all(store, entries).await?;
                Ok((paths, failed))
            }
            PrecachePolicy::BestEffort => {
                let mut cached = Vec::new();
                for (path, key, response) in fetched {
                    match self.db.put(store, &key, &response).await {
                        Ok(()) => cached.push(path),
                        Err(e) => failed.push(FailedAsset { path, reason: e.to_string() }),
                    }
                }
                Ok((cached, failed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{page, url, worker_with};
    use folio_core::{AppConfig, CachedResponse, Request};

    #[tokio::test]
    async fn test_install_precaches_manifest() {
        let worker = worker_with(AppConfig::default()).await;

        let report = worker.install().await.unwrap();

        assert_eq!(report.store, "portfolio-static-v1");
        assert_eq!(report.cached.len(), 9);
        assert!(report.failed.is_empty());
        assert!(report.skip_waiting);
        assert_eq!(worker.state().await, WorkerState::Installed);
        assert!(worker.skip_waiting().await);
        assert_eq!(worker.db().entry_count("portfolio-static-v1").await.unwrap(), 9);

        let about = worker.key_for(&Request::get(url("/about")));
        let stored = worker.db().match_in("portfolio-static-v1", &about).await.unwrap().unwrap();
        assert_eq!(stored.text(), "page /about");
    }

    #[tokio::test]
    async fn test_all_or_nothing_rejects_partial_manifest() {
        let worker = worker_with(AppConfig::default()).await;
        worker.network().respond(url("/og-image.jpg").as_str(), CachedResponse::new(404, "missing"));

        let err = worker.install().await.unwrap_err();

        assert!(err.to_string().contains("PRECACHE_FAILED"), "{err}");
        assert!(err.to_string().contains("/og-image.jpg"));
        assert_eq!(worker.state().await, WorkerState::Redundant);
        assert!(!worker.skip_waiting().await);
        assert_eq!(worker.db().entry_count("portfolio-static-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_best_effort_keeps_what_it_can() {
        let config = AppConfig { precache_policy: PrecachePolicy::BestEffort, ..Default::default() };
        let worker = worker_with(config).await;
        worker.network().respond(url("/favicon.ico").as_str(), CachedResponse::new(500, "boom"));

        let report = worker.install().await.unwrap();

        assert_eq!(report.cached.len(), 8);
        assert_eq!(report.failed, vec![FailedAsset { path: "/favicon.ico".into(), reason: "status 500".into() }]);
        assert_eq!(worker.state().await, WorkerState::Installed);
        assert_eq!(worker.db().entry_count("portfolio-static-v1").await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_install_offline() {
        let worker = worker_with(AppConfig::default()).await;
        worker.network().set_online(false);

        assert!(worker.install().await.is_err());
        assert_eq!(worker.state().await, WorkerState::Redundant);

        worker.network().set_online(true);
        worker.install().await.unwrap();
        assert_eq!(worker.state().await, WorkerState::Installed);
    }

    #[tokio::test]
    async fn test_install_twice_rejected() {
        let worker = worker_with(AppConfig::default()).await;
        worker.install().await.unwrap();

        let err = worker.install().await.unwrap_err();

        assert!(matches!(err, WorkerError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_alternate_manifest() {
        let mut config = AppConfig::default();
        config.routes.static_paths = vec!["/offline".into()];
        let worker = worker_with(config).await;
        worker.network().respond(url("/offline").as_str(), page("offline shell"));

        let report = worker.install().await.unwrap();

        assert_eq!(report.cached, vec!["/offline".to_string()]);
    }
}
