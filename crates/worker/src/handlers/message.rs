//! Page-to-worker messages.
//!
//! Two message types are understood, discriminated by `type`:
//! `REMIX_NAVIGATION` (drives the navigation cache sync) and
//! `SYNC_REMIX_MANIFEST` (retains the route manifest). Anything else, or a
//! payload of the wrong shape, is logged and ignored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sotd_core::Error;

use crate::context::WorkerContext;
use crate::handlers::navigation::{SyncReport, sync_navigation};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerMessage {
    #[serde(rename = "REMIX_NAVIGATION")]
    Navigation(NavigationEvent),

    #[serde(rename = "SYNC_REMIX_MANIFEST")]
    SyncManifest { manifest: Manifest },
}

/// A route change reported by the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEvent {
    /// True for the first navigation after the page loaded.
    pub is_mount: bool,
    pub location: Location,
    #[serde(default)]
    pub matches: Vec<RouteMatch>,
    #[serde(default)]
    pub manifest: Manifest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub pathname: String,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMatch {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub routes: HashMap<String, RouteManifest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteManifest {
    #[serde(default)]
    pub has_loader: bool,
}

impl Manifest {
    /// `None` when the route is not in this manifest.
    pub fn has_loader(&self, route_id: &str) -> Option<bool> {
        self.routes.get(route_id).map(|route| route.has_loader)
    }
}

pub fn decode(data: Value) -> Result<WorkerMessage, Error> {
    serde_json::from_value(data).map_err(|e| Error::InvalidMessage(e.to_string()))
}

/// Handle one message. Returns the sync report for navigation messages.
pub async fn handle_message(ctx: &WorkerContext, data: Value) -> Result<Option<SyncReport>, Error> {
    let message = match decode(data) {
        Ok(message) => message,
        Err(error) => {
            tracing::debug!(%error, "ignoring message");
            return Ok(None);
        }
    };

    match message {
        WorkerMessage::Navigation(event) => sync_navigation(ctx, &event).await.map(Some),
        WorkerMessage::SyncManifest { manifest } => {
            tracing::debug!(routes = manifest.routes.len(), "synced route manifest");
            ctx.set_manifest(manifest).await;
            Ok(None)
        }
    }
}
