//! Background sync: replay queued contact submissions to the relay.

use folio_client::{Network, RelayOutcome, relay_outcome, relay_request};
use folio_core::ContactSubmission;
use serde::Serialize;

use crate::error::WorkerError;
use crate::handler::OfflineWorker;

/// Outcome of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub sent: usize,
    /// Failed this pass but still queued for the next one.
    pub failed: usize,
    /// Rejected by the relay or out of attempts; removed from the queue.
    pub dropped: usize,
    /// Submissions still queued after the pass.
    pub remaining: usize,
}

impl<N: Network> OfflineWorker<N> {
    /// Validate a submission and queue it for the next sync.
    pub async fn queue_submission(&self, submission: &ContactSubmission) -> Result<i64, WorkerError> {
        submission.validate()?;
        let id = self.db.enqueue_submission(submission).await?;
        tracing::info!(id, "queued contact submission");
        Ok(id)
    }

    /// Handle a sync event. Tags other than the configured one are ignored.
    ///
    /// Accepted and rejected submissions leave the queue. Retryable relay
    /// errors stay queued until `max_sync_attempts` is reached; failures to
    /// reach the relay at all always stay queued.
    pub async fn sync(&self, tag: &str) -> Result<Option<SyncReport>, WorkerError> {
        if tag != self.config.sync_tag {
            tracing::debug!(tag, "ignoring sync tag");
            return Ok(None);
        }

        let mut report = SyncReport::default();
        for pending in self.db.pending_submissions().await? {
            let request = relay_request(&self.origin, &self.config.relay_path, &pending.submission)?;
            let (outcome, unreachable) = match self.network_fetch(&request).await {
                Ok(response) => (relay_outcome(&response), false),
                Err(e) => (RelayOutcome::Retry(e.to_string()), e.is_network_failure()),
            };
            let attempts = pending.attempts + 1;

            match outcome {
                RelayOutcome::Accepted => {
                    self.db.remove_submission(pending.id).await?;
                    report.sent += 1;
                }
                RelayOutcome::Rejected(reason) => {
                    tracing::warn!(id = pending.id, %reason, "relay rejected contact submission, dropping");
                    self.db.remove_submission(pending.id).await?;
                    report.dropped += 1;
                }
                RelayOutcome::Retry(reason) if !unreachable && attempts >= self.config.max_sync_attempts => {
                    tracing::warn!(id = pending.id, attempts, %reason, "contact submission out of attempts, dropping");
                    self.db.remove_submission(pending.id).await?;
                    report.dropped += 1;
                }
                RelayOutcome::Retry(reason) => {
                    tracing::warn!(id = pending.id, attempts, %reason, "contact replay failed");
                    self.db.record_submission_failure(pending.id, &reason).await?;
                    report.failed += 1;
                }
            }
        }

        report.remaining = self.db.pending_submissions().await?.len();
        tracing::info!(
            sent = report.sent,
            failed = report.failed,
            dropped = report.dropped,
            remaining = report.remaining,
            "sync finished"
        );
        Ok(Some(report))
    }
}
