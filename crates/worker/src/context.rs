//! Shared state handed to every event handler.

use std::sync::Arc;

use tokio::sync::RwLock;
use url::Url;

use sotd_core::cache::resolve;
use sotd_core::{CacheRegistry, Error, Network, NotificationPort, WorkerConfig, WorkerScope};

use crate::handlers::lifecycle::Lifecycle;
use crate::handlers::message::Manifest;

/// Capability ports the worker is wired to.
pub struct Ports {
    pub network: Arc<dyn Network>,
    pub notifier: Arc<dyn NotificationPort>,
    pub scope: Arc<dyn WorkerScope>,
}

/// Everything a handler may touch: the partitions, the ports, and the small
/// amount of worker-scoped state (lifecycle, last synced manifest).
pub struct WorkerContext {
    pub registry: CacheRegistry,
    pub network: Arc<dyn Network>,
    pub notifier: Arc<dyn NotificationPort>,
    pub scope: Arc<dyn WorkerScope>,
    pub lifecycle: Lifecycle,
    origin: Url,
    precache: Vec<Url>,
    manifest: RwLock<Option<Manifest>>,
}

impl WorkerContext {
    pub fn new(config: &WorkerConfig, registry: CacheRegistry, ports: Ports) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let precache = config
            .precache_urls
            .iter()
            .map(|url| resolve(&origin, url).map_err(Error::from))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            registry,
            network: ports.network,
            notifier: ports.notifier,
            scope: ports.scope,
            lifecycle: Lifecycle::new(),
            origin,
            precache,
            manifest: RwLock::new(None),
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// URLs to pre-warm into the asset partition on install.
    pub fn precache(&self) -> &[Url] {
        &self.precache
    }

    /// Resolve a page-relative URL against the worker origin.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        Ok(resolve(&self.origin, input)?)
    }

    pub async fn set_manifest(&self, manifest: Manifest) {
        *self.manifest.write().await = Some(manifest);
    }

    /// Loader flag for `route_id` from the last manifest the page synced.
    pub async fn synced_has_loader(&self, route_id: &str) -> Option<bool> {
        self.manifest.read().await.as_ref().and_then(|m| m.has_loader(route_id))
    }
}
