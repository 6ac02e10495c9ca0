//! Activate: retire stores from earlier versions, then claim open pages.

use folio_client::Network;
use serde::Serialize;

use crate::error::WorkerError;
use crate::handler::{OfflineWorker, WorkerState};

/// Outcome of a completed activation.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
    pub clients_claimed: bool,
}

impl<N: Network> OfflineWorker<N> {
    /// Run the activation phase.
    ///
    /// Every store not named by the current version is deleted before
    /// clients are claimed.
    pub async fn activate(&self) -> Result<ActivateReport, WorkerError> {
        {
            let mut lifecycle = self.lifecycle.write().await;
            if lifecycle.state != WorkerState::Installed {
                return Err(WorkerError::InvalidState(format!("cannot activate from {:?}", lifecycle.state)));
            }
            lifecycle.state = WorkerState::Activating;
        }

        let (deleted, kept) = match self.delete_stale_stores().await {
            Ok(split) => split,
            Err(e) => {
                self.set_state(WorkerState::Installed).await;
                return Err(e);
            }
        };

        {
            let mut lifecycle = self.lifecycle.write().await;
            lifecycle.clients_claimed = true;
        }
        self.set_state(WorkerState::Activated).await;

        Ok(ActivateReport { deleted, kept, clients_claimed: true })
    }

    async fn delete_stale_stores(&self) -> Result<(Vec<String>, Vec<String>), WorkerError> {
        let mut deleted = Vec::new();
        let mut kept = Vec::new();
        for name in self.db.store_names().await? {
            if self.names.is_current(&name) {
                kept.push(name);
                continue;
            }
            tracing::info!(store = %name, "deleting old cache");
            self.db.delete_store(&name).await?;
            deleted.push(name);
        }
        Ok((deleted, kept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{page, url, worker_with};
    use folio_core::{AppConfig, Request, RequestKey};

    #[tokio::test]
    async fn test_activate_purges_stale_stores() {
        let worker = worker_with(AppConfig { cache_version: "v2".into(), ..Default::default() }).await;
        let about = RequestKey::get(&url("/about"));
        worker.db().put("portfolio-static-v1", &about, &page("old about")).await.unwrap();
        worker.db().put("portfolio-dynamic-v1", &about, &page("old about")).await.unwrap();
        worker.db().put("portfolio-v1", &about, &page("older still")).await.unwrap();
        worker.db().open_store("portfolio-dynamic-v2").await.unwrap();
        worker.install().await.unwrap();

        let report = worker.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["portfolio-static-v1", "portfolio-dynamic-v1", "portfolio-v1"]);
        assert_eq!(report.kept, vec!["portfolio-dynamic-v2", "portfolio-static-v2"]);
        assert_eq!(worker.db().store_names().await.unwrap(), report.kept);
        assert!(report.clients_claimed);
        assert!(worker.clients_claimed().await);
        assert_eq!(worker.state().await, WorkerState::Activated);

        let hit = worker.db().match_any(&worker.key_for(&Request::get(url("/about")))).await.unwrap().unwrap();
        assert_eq!(hit.text(), "page /about");
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let worker = worker_with(AppConfig::default()).await;

        let err = worker.activate().await.unwrap_err();

        assert!(matches!(err, WorkerError::InvalidState(_)));
        assert!(!worker.clients_claimed().await);
    }

    #[tokio::test]
    async fn test_redundant_worker_never_activates() {
        let worker = worker_with(AppConfig::default()).await;
        worker.network().set_online(false);
        let _ = worker.install().await;

        assert!(worker.activate().await.is_err());
        assert_eq!(worker.state().await, WorkerState::Redundant);
    }
}
