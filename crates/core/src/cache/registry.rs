//! Explicit registry of named partitions.
//!
//! Every component that touches the caches receives a [`CacheRegistry`]
//! rather than reaching for ambient global state, so tests can swap the
//! persistent backend for an in-memory one.

use std::sync::Arc;

use super::backend::CacheBackend;
use super::connection::CacheDb;
use super::memory::MemoryBackend;
use super::partition::{MatchOptions, Partition};
use crate::Error;
use crate::net::{Request, Response};

#[derive(Clone)]
pub struct CacheRegistry {
    backend: Arc<dyn CacheBackend>,
}

impl CacheRegistry {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn sqlite(db: CacheDb) -> Self {
        Self::new(Arc::new(db))
    }

    /// Open a partition, creating it on first use.
    pub async fn open(&self, name: &str) -> Result<Partition, Error> {
        self.backend.create_partition(name).await?;
        Ok(Partition::new(name, self.backend.clone()))
    }

    /// Names of every partition opened so far, in creation order.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.backend.partitions().await
    }

    pub async fn has(&self, name: &str) -> Result<bool, Error> {
        Ok(self.keys().await?.iter().any(|k| k == name))
    }

    /// Match within one named partition without creating it.
    pub async fn match_in(
        &self, name: &str, request: &Request, options: MatchOptions,
    ) -> Result<Option<Response>, Error> {
        if !self.has(name).await? {
            return Ok(None);
        }
        Partition::new(name, self.backend.clone())
            .match_request(request, options)
            .await
    }

    /// Match across every partition, oldest partition first.
    pub async fn match_any(&self, request: &Request, options: MatchOptions) -> Result<Option<Response>, Error> {
        for name in self.keys().await? {
            let found = Partition::new(&name, self.backend.clone())
                .match_request(request, options)
                .await?;
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }
}
