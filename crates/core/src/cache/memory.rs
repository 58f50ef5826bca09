//! In-memory partition backend.
//!
//! Used for tests and for hosts started without a database path.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::backend::CacheBackend;
use super::entry::StoredResponse;
use super::key::CacheKey;
use crate::Error;

#[derive(Default)]
struct MemoryState {
    order: Vec<String>,
    partitions: HashMap<String, Vec<(CacheKey, StoredResponse)>>,
}

/// Partitions held in a `HashMap` behind a tokio `RwLock`.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn create_partition(&self, name: &str) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if !state.partitions.contains_key(name) {
            state.order.push(name.to_string());
            state.partitions.insert(name.to_string(), Vec::new());
        }
        Ok(())
    }

    async fn partitions(&self) -> Result<Vec<String>, Error> {
        Ok(self.state.read().await.order.clone())
    }

    async fn lookup(
        &self, partition: &str, key: &CacheKey, ignore_search: bool,
    ) -> Result<Vec<StoredResponse>, Error> {
        let state = self.state.read().await;
        let Some(entries) = state.partitions.get(partition) else {
            return Ok(Vec::new());
        };

        Ok(entries
            .iter()
            .filter(|(stored, _)| {
                if ignore_search {
                    stored.without_search() == key.without_search()
                } else {
                    stored.url() == key.url()
                }
            })
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    async fn store(&self, partition: &str, key: &CacheKey, entry: StoredResponse) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if !state.partitions.contains_key(partition) {
            state.order.push(partition.to_string());
        }
        let entries = state.partitions.entry(partition.to_string()).or_default();

        match entries.iter_mut().find(|(stored, _)| stored.url() == key.url()) {
            Some(slot) => slot.1 = entry,
            None => entries.push((key.clone(), entry)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use url::Url;

    fn key(url: &str) -> CacheKey {
        CacheKey::from_url(&Url::parse(url).unwrap())
    }

    fn entry(body: &'static str) -> StoredResponse {
        StoredResponse {
            status: 200,
            headers: Vec::new(),
            body: Bytes::from_static(body.as_bytes()),
            vary: Vec::new(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_partitions_in_creation_order() {
        let backend = MemoryBackend::new();
        backend.create_partition("asset-cache").await.unwrap();
        backend.create_partition("data-cache").await.unwrap();
        backend.create_partition("asset-cache").await.unwrap();

        assert_eq!(backend.partitions().await.unwrap(), vec!["asset-cache", "data-cache"]);
    }

    #[tokio::test]
    async fn test_store_replaces() {
        let backend = MemoryBackend::new();
        let k = key("http://localhost:3000/a");
        backend.store("p", &k, entry("one")).await.unwrap();
        backend.store("p", &k, entry("two")).await.unwrap();

        let found = backend.lookup("p", &k, false).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].body, Bytes::from_static(b"two"));
    }

    #[tokio::test]
    async fn test_lookup_ignore_search() {
        let backend = MemoryBackend::new();
        backend
            .store("p", &key("http://localhost:3000/icons/a.png?v=1"), entry("icon"))
            .await
            .unwrap();

        let plain = key("http://localhost:3000/icons/a.png");
        assert!(backend.lookup("p", &plain, false).await.unwrap().is_empty());
        assert_eq!(backend.lookup("p", &plain, true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_unknown_partition() {
        let backend = MemoryBackend::new();
        let found = backend.lookup("missing", &key("http://localhost:3000/"), false).await.unwrap();
        assert!(found.is_empty());
    }
}
