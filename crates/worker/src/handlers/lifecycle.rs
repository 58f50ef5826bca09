//! Install and activate.
//!
//! Install pre-warms the asset partition (nothing by default) and then skips
//! waiting; activate claims every open page. Both may run more than once.

use futures::future::join_all;
use tokio::sync::RwLock;

use sotd_core::Error;
use sotd_core::cache::ASSET_CACHE;

use crate::context::WorkerContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

#[derive(Debug)]
pub struct Lifecycle {
    state: RwLock<LifecycleState>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self { state: RwLock::new(LifecycleState::Parsed) }
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Move to `next` if it is ahead of the current state. Returns whether
    /// the state changed.
    pub async fn advance(&self, next: LifecycleState) -> bool {
        let mut state = self.state.write().await;
        if next > *state {
            *state = next;
            true
        } else {
            false
        }
    }
}

pub async fn install(ctx: &WorkerContext) -> Result<(), Error> {
    ctx.lifecycle.advance(LifecycleState::Installing).await;

    prewarm(ctx).await;

    ctx.lifecycle.advance(LifecycleState::Installed).await;
    tracing::info!("Service worker installed");

    ctx.scope.skip_waiting().await
}

pub async fn activate(ctx: &WorkerContext) -> Result<(), Error> {
    ctx.lifecycle.advance(LifecycleState::Activating).await;
    tracing::info!("Service worker activated");

    ctx.scope.claim_clients().await?;
    ctx.lifecycle.advance(LifecycleState::Activated).await;
    Ok(())
}

/// Store the configured precache URLs. A URL that fails is skipped.
async fn prewarm(ctx: &WorkerContext) {
    if ctx.precache().is_empty() {
        return;
    }

    let assets = match ctx.registry.open(ASSET_CACHE).await {
        Ok(partition) => partition,
        Err(error) => {
            tracing::warn!(%error, "could not open asset cache for pre-warming");
            return;
        }
    };

    let results = join_all(ctx.precache().iter().map(|url| {
        let assets = &assets;
        async move { (url, assets.add(ctx.network.as_ref(), url.clone()).await) }
    }))
    .await;

    for (url, result) in results {
        match result {
            Ok(()) => tracing::debug!(%url, "pre-warmed asset"),
            Err(error) => tracing::warn!(%url, %error, "failed to pre-warm asset"),
        }
    }
}
