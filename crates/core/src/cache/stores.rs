//! Named cache store operations.
//!
//! Stores are created on demand, listed in creation order and deleted as a
//! whole. Entries are whole-object upserts keyed by [`RequestKey`], so two
//! writers racing on one key leave exactly one of their values behind.

use super::connection::CacheDb;
use super::hash::RequestKey;
use crate::Error;
use crate::http::CachedResponse;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

fn decode_response(
    status: i64, status_text: String, headers_json: String, body: Vec<u8>,
) -> Result<CachedResponse, Error> {
    let status =
        u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status} out of range")))?;
    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
    Ok(CachedResponse { status, status_text, headers, body })
}

type EntryRow = (i64, String, String, Vec<u8>);

fn read_entry(row: &rusqlite::Row<'_>) -> Result<EntryRow, rusqlite::Error> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn ensure_store(conn: &rusqlite::Connection, name: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO cache_stores (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn upsert_entry(
    conn: &rusqlite::Connection, store: &str, key: &RequestKey, response: &CachedResponse, headers_json: &str,
) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO cache_entries (
            store, key_hash, method, url, status, status_text, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(store, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            store,
            &key.hash,
            &key.method,
            &key.url,
            response.status,
            &response.status_text,
            headers_json,
            &response.body,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Create a store if it does not exist yet.
    pub async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> { Ok(ensure_store(conn, &name)?) })
            .await
            .map_err(Error::from)
    }

    /// Names of all stores, oldest first.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM cache_stores WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and all of its entries.
    ///
    /// Returns false if no store had that name.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response under `key`, replacing any previous entry.
    ///
    /// The store is created if needed.
    pub async fn put(&self, store: &str, key: &RequestKey, response: &CachedResponse) -> Result<(), Error> {
        let store = store.to_string();
        let key = key.clone();
        let response = response.clone();
        let headers_json = serde_json::to_string(&response.headers)?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_store(conn, &store)?;
                upsert_entry(conn, &store, &key, &response, &headers_json)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Store a batch of responses in one transaction.
    ///
    /// Either every entry is written or none is.
    pub async fn put_all(&self, store: &str, entries: Vec<(RequestKey, CachedResponse)>) -> Result<usize, Error> {
        let store = store.to_string();
        let encoded = entries
            .into_iter()
            .map(|(key, response)| -> Result<_, Error> {
                Ok((serde_json::to_string(&response.headers)?, key, response))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &store)?;
                for (headers_json, key, response) in &encoded {
                    upsert_entry(&tx, &store, key, response, headers_json)?;
                }
                tx.commit()?;
                Ok(encoded.len())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up `key` in one store.
    pub async fn match_in(&self, store: &str, key: &RequestKey) -> Result<Option<CachedResponse>, Error> {
        let store = store.to_string();
        let hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let row = conn
                    .query_row(
                        "SELECT status, status_text, headers_json, body FROM cache_entries
                         WHERE store = ?1 AND key_hash = ?2",
                        params![store, hash],
                        read_entry,
                    )
                    .optional()?;
                row.map(|(status, text, headers, body)| decode_response(status, text, headers, body))
                    .transpose()
            })
            .await
            .map_err(Error::from)
    }

    /// Look up `key` across every store, oldest store first.
    pub async fn match_any(&self, key: &RequestKey) -> Result<Option<CachedResponse>, Error> {
        let hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.status_text, e.headers_json, e.body
                         FROM cache_entries e JOIN cache_stores s ON s.name = e.store
                         WHERE e.key_hash = ?1
                         ORDER BY s.rowid ASC
                         LIMIT 1",
                        params![hash],
                        read_entry,
                    )
                    .optional()?;
                row.map(|(status, text, headers, body)| decode_response(status, text, headers, body))
                    .transpose()
            })
            .await
            .map_err(Error::from)
    }

    /// Remove one entry. Returns false if it was not present.
    pub async fn delete_entry(&self, store: &str, key: &RequestKey) -> Result<bool, Error> {
        let store = store.to_string();
        let hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE store = ?1 AND key_hash = ?2",
                    params![store, hash],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a store; zero if it does not exist.
    pub async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
