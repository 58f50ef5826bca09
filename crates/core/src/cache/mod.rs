//! Cache store adapter.
//!
//! Three named partitions hold responses keyed by normalized request URL:
//!
//! - `asset-cache`: static build output and icons, matched ignoring query
//!   string and `Vary`
//! - `data-cache`: route data responses, matched on the exact URL
//! - `document-cache`: full HTML documents, matched on the exact URL
//!
//! Partitions are created lazily on first open and persist for as long as the
//! backend does. Entries are replaced on refetch and never evicted.

pub mod backend;
pub mod connection;
pub mod entry;
pub mod key;
pub mod memory;
pub mod migrations;
pub mod partition;
pub mod registry;
pub mod sqlite;

pub use crate::Error;

pub use backend::CacheBackend;
pub use connection::CacheDb;
pub use entry::StoredResponse;
pub use key::{CacheKey, UrlError, resolve};
pub use memory::MemoryBackend;
pub use partition::{MatchOptions, Partition};
pub use registry::CacheRegistry;

pub const ASSET_CACHE: &str = "asset-cache";
pub const DATA_CACHE: &str = "data-cache";
pub const DOCUMENT_CACHE: &str = "document-cache";
