//! Navigation cache sync.
//!
//! On every route change the page reports, pull the new document and (on
//! the initial mount) the data of every matched route with a loader into the
//! caches, so the same navigation can be replayed offline.

use std::collections::HashSet;

use futures::future::join_all;
use serde::Serialize;
use url::Url;
use url::form_urlencoded;

use sotd_core::cache::{DATA_CACHE, DOCUMENT_CACHE};
use sotd_core::classify::DATA_PARAM;
use sotd_core::{Error, MatchOptions, Partition, Request};

use crate::context::WorkerContext;
use crate::handlers::message::{Location, NavigationEvent};

/// How many fetch-and-store operations one navigation scheduled, by target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub documents: usize,
    pub data: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Document,
    Data,
}

/// `pathname + search + hash`, exactly as the page reported them.
pub fn document_url(location: &Location) -> String {
    format!("{}{}{}", location.pathname, location.search, location.hash)
}

/// The location with its `_data` parameter set to `route_id`.
///
/// Existing query parameters are kept in order; an existing `_data` is
/// replaced in place and any duplicates dropped.
pub fn data_url(location: &Location, route_id: &str) -> String {
    let query = location.search.strip_prefix('?').unwrap_or(&location.search);

    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut replaced = false;
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        if name == DATA_PARAM {
            if !replaced {
                pairs.push((name.into_owned(), route_id.to_string()));
                replaced = true;
            }
        } else {
            pairs.push((name.into_owned(), value.into_owned()));
        }
    }
    if !replaced {
        pairs.push((DATA_PARAM.to_string(), route_id.to_string()));
    }

    let search = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();

    format!("{}?{}{}", location.pathname, search, location.hash)
}

/// Populate the document and data partitions for one navigation.
///
/// Individual fetch failures are logged and counted, never returned. A
/// partition that cannot be opened only skips its own targets, which are
/// counted as failed.
pub async fn sync_navigation(ctx: &WorkerContext, event: &NavigationEvent) -> Result<SyncReport, Error> {
    let document = ctx.resolve(&document_url(&event.location))?;
    let request = Request::get(document.clone());

    let (data_cache, document_cache, existing) = tokio::join!(
        ctx.registry.open(DATA_CACHE),
        ctx.registry.open(DOCUMENT_CACHE),
        ctx.registry.match_any(&request, MatchOptions::EXACT),
    );
    let data_cache = usable(DATA_CACHE, data_cache);
    let document_cache = usable(DOCUMENT_CACHE, document_cache);
    let existing = existing.unwrap_or_else(|error| {
        tracing::warn!(url = %document, %error, "document cache lookup failed");
        None
    });

    let mut seen = HashSet::new();
    let mut scheduled: Vec<(Target, Url)> = Vec::new();

    // On mount the browser has usually stored the document already.
    if existing.is_none() || !event.is_mount {
        tracing::debug!(url = %document, "Caching document");
        seen.insert(document.to_string());
        scheduled.push((Target::Document, document));
    }

    if event.is_mount {
        for route in &event.matches {
            if !has_loader(ctx, event, &route.id).await {
                continue;
            }

            let url = match ctx.resolve(&data_url(&event.location, &route.id)) {
                Ok(url) => url,
                Err(error) => {
                    tracing::warn!(route = %route.id, %error, "skipping data URL");
                    continue;
                }
            };

            if seen.insert(url.to_string()) {
                tracing::debug!(%url, "Caching data");
                scheduled.push((Target::Data, url));
            }
        }
    }

    let results = join_all(scheduled.into_iter().map(|(target, url)| {
        let partition = match target {
            Target::Document => document_cache.as_ref(),
            Target::Data => data_cache.as_ref(),
        };
        async move {
            let Some(partition) = partition else {
                return (target, false);
            };
            let result = partition.add(ctx.network.as_ref(), url.clone()).await;
            if let Err(error) = &result {
                tracing::warn!(%url, partition = partition.name(), %error, "Failed to cache navigation");
            }
            (target, result.is_ok())
        }
    }))
    .await;

    let mut report = SyncReport::default();
    for (target, ok) in results {
        match target {
            Target::Document => report.documents += 1,
            Target::Data => report.data += 1,
        }
        if !ok {
            report.failed += 1;
        }
    }
    Ok(report)
}

fn usable(name: &str, opened: Result<Partition, Error>) -> Option<Partition> {
    match opened {
        Ok(partition) => Some(partition),
        Err(error) => {
            tracing::warn!(partition = name, %error, "cannot open partition, skipping its navigation targets");
            None
        }
    }
}

/// Loader flag from the event's manifest, then the synced manifest.
/// Unknown routes have no loader.
async fn has_loader(ctx: &WorkerContext, event: &NavigationEvent, route_id: &str) -> bool {
    match event.manifest.has_loader(route_id) {
        Some(flag) => flag,
        None => ctx.synced_has_loader(route_id).await.unwrap_or(false),
    }
}
