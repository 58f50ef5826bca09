//! Storage backend behind the named partitions.

use async_trait::async_trait;

use super::entry::StoredResponse;
use super::key::CacheKey;
use crate::Error;

/// Persistent key -> response storage, grouped into named partitions.
///
/// Each operation is atomic at the single-entry level; concurrent writers to
/// the same key race with last-write-wins semantics.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Register a partition if it does not exist yet.
    async fn create_partition(&self, name: &str) -> Result<(), Error>;

    /// Partition names in creation order.
    async fn partitions(&self) -> Result<Vec<String>, Error>;

    /// Candidate entries for `key`, oldest first.
    ///
    /// With `ignore_search` every entry whose query-less URL matches is a
    /// candidate; otherwise only the exact URL is.
    async fn lookup(&self, partition: &str, key: &CacheKey, ignore_search: bool)
    -> Result<Vec<StoredResponse>, Error>;

    /// Insert or replace the entry for `key`.
    async fn store(&self, partition: &str, key: &CacheKey, entry: StoredResponse) -> Result<(), Error>;
}
