//! SQLite-backed partition storage.
//!
//! Entries are upserted on `(partition, url)`; a refetch replaces the row in
//! place and keeps its original insertion order.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_rusqlite::params;

use super::backend::CacheBackend;
use super::connection::CacheDb;
use super::entry::StoredResponse;
use super::key::CacheKey;
use crate::Error;

#[async_trait]
impl CacheBackend for CacheDb {
    async fn create_partition(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![name, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY rowid")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn lookup(
        &self, partition: &str, key: &CacheKey, ignore_search: bool,
    ) -> Result<Vec<StoredResponse>, Error> {
        let partition = partition.to_string();
        let (sql, needle) = if ignore_search {
            (
                "SELECT status, headers_json, body, vary_json, stored_at
                 FROM entries WHERE partition = ?1 AND url_without_search = ?2 ORDER BY rowid",
                key.without_search().to_string(),
            )
        } else {
            (
                "SELECT status, headers_json, body, vary_json, stored_at
                 FROM entries WHERE partition = ?1 AND url = ?2 ORDER BY rowid",
                key.url().to_string(),
            )
        };

        self.conn
            .call(move |conn| -> Result<Vec<StoredResponse>, Error> {
                let mut stmt = conn.prepare(sql)?;
                let rows = stmt.query_map(params![partition, needle], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })?;

                let mut found = Vec::new();
                for row in rows {
                    let (status, headers_json, body, vary_json, stored_at) = row?;
                    let status = u16::try_from(status).map_err(|e| Error::Cache(e.to_string()))?;
                    found.push(StoredResponse {
                        status,
                        headers: serde_json::from_str(&headers_json)?,
                        body: Bytes::from(body),
                        vary: serde_json::from_str(&vary_json)?,
                        stored_at,
                    });
                }
                Ok(found)
            })
            .await
            .map_err(Error::from)
    }

    async fn store(&self, partition: &str, key: &CacheKey, entry: StoredResponse) -> Result<(), Error> {
        let partition = partition.to_string();
        let url = key.url().to_string();
        let without_search = key.without_search().to_string();
        let headers_json = serde_json::to_string(&entry.headers)?;
        let vary_json = serde_json::to_string(&entry.vary)?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
                    params![&partition, chrono::Utc::now().to_rfc3339()],
                )?;
                conn.execute(
                    "INSERT INTO entries (
                        partition, url, url_without_search, status,
                        headers_json, body, vary_json, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(partition, url) DO UPDATE SET
                        url_without_search = excluded.url_without_search,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        vary_json = excluded.vary_json,
                        stored_at = excluded.stored_at",
                    params![
                        &partition,
                        &url,
                        &without_search,
                        entry.status as i64,
                        &headers_json,
                        entry.body.as_ref(),
                        &vary_json,
                        &entry.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
