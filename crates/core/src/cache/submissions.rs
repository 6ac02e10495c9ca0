//! Durable queue of contact submissions awaiting replay.
//!
//! Submissions that could not reach the relay while offline are persisted
//! here and removed once the relay accepts them.

use super::connection::CacheDb;
use crate::Error;
use crate::contact::ContactSubmission;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A queued submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSubmission {
    pub id: i64,
    pub submission: ContactSubmission,
    pub created_at: String,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl CacheDb {
    /// Queue a submission and return its id.
    pub async fn enqueue_submission(&self, submission: &ContactSubmission) -> Result<i64, Error> {
        let payload = serde_json::to_string(submission)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<i64, Error> {
                conn.execute(
                    "INSERT INTO pending_submissions (payload_json, created_at) VALUES (?1, ?2)",
                    params![payload, now],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(Error::from)
    }

    /// All queued submissions, oldest first.
    pub async fn pending_submissions(&self) -> Result<Vec<PendingSubmission>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PendingSubmission>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, payload_json, created_at, attempts, last_error
                     FROM pending_submissions ORDER BY id ASC",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, u32>(3)?,
                            row.get::<_, Option<String>>(4)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(id, payload, created_at, attempts, last_error)| -> Result<PendingSubmission, Error> {
                        Ok(PendingSubmission {
                            id,
                            submission: serde_json::from_str(&payload)?,
                            created_at,
                            attempts,
                            last_error,
                        })
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }

    /// Remove a submission. Returns false if the id was unknown.
    pub async fn remove_submission(&self, id: i64) -> Result<bool, Error> {
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM pending_submissions WHERE id = ?1", params![id])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Count a failed replay attempt against a submission.
    pub async fn record_submission_failure(&self, id: i64, reason: &str) -> Result<(), Error> {
        let reason = reason.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "UPDATE pending_submissions SET attempts = attempts + 1, last_error = ?2 WHERE id = ?1",
                    params![id, reason],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(name: &str) -> ContactSubmission {
        ContactSubmission {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            company: Some("ACME".into()),
            message: "Let's talk about a project.".into(),
        }
    }

    #[tokio::test]
    async fn test_enqueue_and_list_in_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let first = db.enqueue_submission(&submission("Ada")).await.unwrap();
        let second = db.enqueue_submission(&submission("Grace")).await.unwrap();
        assert!(second > first);

        let pending = db.pending_submissions().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].id, first);
        assert_eq!(pending[0].submission, submission("Ada"));
        assert_eq!(pending[0].attempts, 0);
        assert!(pending[0].last_error.is_none());
        assert_eq!(pending[1].submission.name, "Grace");
    }

    #[tokio::test]
    async fn test_remove_submission() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let id = db.enqueue_submission(&submission("Ada")).await.unwrap();

        assert!(db.remove_submission(id).await.unwrap());
        assert!(!db.remove_submission(id).await.unwrap());
        assert!(db.pending_submissions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_failure() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let id = db.enqueue_submission(&submission("Ada")).await.unwrap();

        db.record_submission_failure(id, "NETWORK_ERROR: offline").await.unwrap();
        db.record_submission_failure(id, "relay returned 503").await.unwrap();

        let pending = db.pending_submissions().await.unwrap();
        assert_eq!(pending[0].attempts, 2);
        assert_eq!(pending[0].last_error.as_deref(), Some("relay returned 503"));
    }
}
