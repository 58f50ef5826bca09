//! Push subscription persistence.
//!
//! A minimal key-value contract; the notification path and the page glue
//! depend on nothing more than `init`/`get`/`set`.

use async_trait::async_trait;
use serde_json::Value;
use tokio_rusqlite::{params, rusqlite};

use crate::Error;
use crate::cache::CacheDb;

/// Key under which the browser's push subscription is stored.
pub const SUBSCRIPTION_KEY: &str = "subscription";

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Prepare the store. Safe to call more than once.
    async fn init(&self) -> Result<(), Error>;

    async fn get(&self, key: &str) -> Result<Option<Value>, Error>;

    async fn set(&self, key: &str, value: &Value) -> Result<(), Error>;
}

#[async_trait]
impl SubscriptionStore for CacheDb {
    async fn init(&self) -> Result<(), Error> {
        // Schema is created by the migrations when the database is opened.
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Value>, Error> {
                let result = conn.query_row("SELECT value_json FROM kv WHERE key = ?1", params![key], |row| {
                    row.get::<_, String>(0)
                });

                match result {
                    Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn set(&self, key: &str, value: &Value) -> Result<(), Error> {
        let key = key.to_string();
        let json = serde_json::to_string(value)?;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv (key, value_json, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                        value_json = excluded.value_json,
                        updated_at = excluded.updated_at",
                    params![key, json, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

/// Persist a push subscription if it looks like one.
///
/// Only objects with a string `endpoint` are stored. Returns whether the
/// value was saved.
pub async fn save_subscription(store: &dyn SubscriptionStore, subscription: &Value) -> Result<bool, Error> {
    if !subscription.get("endpoint").is_some_and(Value::is_string) {
        tracing::debug!("ignoring push subscription without endpoint");
        return Ok(false);
    }

    store.init().await?;
    store.set(SUBSCRIPTION_KEY, subscription).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_then_get_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.set("k", &json!({"a": 1})).await.unwrap();
        db.set("k", &json!({"a": 2})).await.unwrap();

        assert_eq!(db.get("k").await.unwrap(), Some(json!({"a": 2})));
    }

    #[tokio::test]
    async fn test_save_subscription_requires_endpoint() {
        let db = CacheDb::open_in_memory().await.unwrap();

        let saved = save_subscription(&db, &json!({"keys": {}})).await.unwrap();
        assert!(!saved);
        assert!(db.get(SUBSCRIPTION_KEY).await.unwrap().is_none());

        let saved = save_subscription(&db, &json!({"endpoint": 42})).await.unwrap();
        assert!(!saved);
    }

    #[tokio::test]
    async fn test_save_subscription() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let subscription = json!({
            "endpoint": "https://push.example/abc",
            "keys": {"p256dh": "k", "auth": "a"}
        });

        assert!(save_subscription(&db, &subscription).await.unwrap());
        assert_eq!(db.get(SUBSCRIPTION_KEY).await.unwrap(), Some(subscription));
    }
}
