//! Fetch interception.
//!
//! Every intercepted request runs exactly one strategy, chosen by
//! classification:
//!
//! - Asset: cache-first against `asset-cache`, ignoring query and `Vary`;
//!   only `200` responses are stored
//! - DataFetch: network-first into `data-cache`; on network failure the
//!   cached copy is tagged `X-Remix-Worker: yes`, or a synthesized `500`
//!   JSON error is returned
//! - DocumentNavigation: network-first into `document-cache`; on network
//!   failure with no cached copy the failure propagates
//! - Other: straight to the network, never cached
//!
//! [`respond_with`] wraps all of this so the page always receives a response.

use http::{HeaderName, HeaderValue, StatusCode};
use serde_json::json;
use url::Url;

use sotd_core::cache::{ASSET_CACHE, DATA_CACHE, DOCUMENT_CACHE};
use sotd_core::{Error, MatchOptions, Request, RequestKind, Response, classify};

use crate::context::WorkerContext;

/// Marks a response produced by the worker rather than the network.
pub const WORKER_HEADER: HeaderName = HeaderName::from_static("x-remix-worker");

/// Marks a synthesized error response.
pub const CATCH_HEADER: HeaderName = HeaderName::from_static("x-remix-catch");

/// Top-level interception: always yields exactly one response.
///
/// A strategy error becomes an empty default response.
pub async fn respond_with(ctx: &WorkerContext, request: Request) -> Response {
    let url = request.url.clone();
    let result = handle_fetch(ctx, request).await;
    resolve_fetch(&url, result)
}

fn resolve_fetch(url: &Url, result: Result<Response, Error>) -> Response {
    match result {
        Ok(response) => response,
        Err(error) => {
            tracing::debug!(%url, %error, "fetch handler failed, responding with empty response");
            Response::default()
        }
    }
}

/// Run the strategy for `request`'s category.
pub async fn handle_fetch(ctx: &WorkerContext, request: Request) -> Result<Response, Error> {
    match classify(&request) {
        RequestKind::Asset => cache_first(ctx, &request).await,
        RequestKind::DataFetch => network_first_data(ctx, &request).await,
        RequestKind::DocumentNavigation => network_first_document(ctx, &request).await,
        RequestKind::Other => ctx.network.fetch(request).await,
    }
}

async fn cache_first(ctx: &WorkerContext, request: &Request) -> Result<Response, Error> {
    let path = request.url.path();

    match ctx.registry.match_in(ASSET_CACHE, request, MatchOptions::LOOSE).await {
        Ok(Some(cached)) => {
            tracing::debug!(path, "Serving asset from cache");
            return Ok(cached);
        }
        Ok(None) => {}
        Err(error) => tracing::warn!(path, %error, "asset cache lookup failed"),
    }

    tracing::debug!(path, "Serving asset from network");
    let response = ctx.network.fetch(request.clone()).await?;

    // Error pages are never cached.
    if response.status() == StatusCode::OK {
        store(ctx, ASSET_CACHE, request, &response).await?;
    }

    Ok(response)
}

async fn network_first_data(ctx: &WorkerContext, request: &Request) -> Result<Response, Error> {
    tracing::debug!(url = %request.url, "Serving data from network");

    match ctx.network.fetch(request.clone()).await {
        Ok(response) => {
            store(ctx, DATA_CACHE, request, &response).await?;
            Ok(response)
        }
        Err(error) => {
            tracing::debug!(url = %request.url, %error, "Serving data from network failed, falling back to cache");

            match cached(ctx, DATA_CACHE, request).await {
                Some(mut response) => {
                    response.headers_mut().insert(WORKER_HEADER, HeaderValue::from_static("yes"));
                    Ok(response)
                }
                None => network_error_response(),
            }
        }
    }
}

async fn network_first_document(ctx: &WorkerContext, request: &Request) -> Result<Response, Error> {
    tracing::debug!(path = request.url.path(), "Serving document from network");

    match ctx.network.fetch(request.clone()).await {
        Ok(response) => {
            store(ctx, DOCUMENT_CACHE, request, &response).await?;
            Ok(response)
        }
        Err(error) => {
            tracing::debug!(
                path = request.url.path(),
                %error,
                "Serving document from network failed, falling back to cache"
            );
            cached(ctx, DOCUMENT_CACHE, request).await.ok_or(error)
        }
    }
}

/// The `500` body handed to the page when data is unavailable everywhere.
fn network_error_response() -> Result<Response, Error> {
    let mut response = Response::json(&json!({ "message": "Network Error" }), StatusCode::INTERNAL_SERVER_ERROR)?;
    let headers = response.headers_mut();
    headers.insert(CATCH_HEADER, HeaderValue::from_static("yes"));
    headers.insert(WORKER_HEADER, HeaderValue::from_static("yes"));
    Ok(response)
}

/// Exact-URL lookup; cache failures count as a miss.
async fn cached(ctx: &WorkerContext, partition: &str, request: &Request) -> Option<Response> {
    ctx.registry
        .match_in(partition, request, MatchOptions::EXACT)
        .await
        .unwrap_or_else(|error| {
            tracing::warn!(partition, url = %request.url, %error, "cache lookup failed");
            None
        })
}

/// Store a copy of `response`. Only a consumed body is an error; cache
/// write failures are logged and swallowed.
async fn store(ctx: &WorkerContext, partition: &str, request: &Request, response: &Response) -> Result<(), Error> {
    let copy = response.try_clone()?;
    if let Err(error) = put(ctx, partition, request, copy).await {
        tracing::warn!(partition, url = %request.url, %error, "failed to store response");
    }
    Ok(())
}

async fn put(ctx: &WorkerContext, partition: &str, request: &Request, response: Response) -> Result<(), Error> {
    ctx.registry.open(partition).await?.put(request, response).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingBackend, Harness};
    use http::Method;
    use sotd_core::WorkerConfig;
    use std::sync::Arc;

    fn failing() -> (Harness, Arc<FailingBackend>) {
        let backend = Arc::new(FailingBackend::default());
        (Harness::with_backend(WorkerConfig::default(), backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_asset_cache_first() {
        let h = Harness::new();
        h.network.route("http://localhost:3000/build/root-abc.js", StatusCode::OK, "js");

        let mut first = respond_with(&h.ctx, h.get("/build/root-abc.js")).await;
        assert_eq!(first.text().unwrap(), "js");
        assert_eq!(h.network.call_count(), 1);

        let mut second = respond_with(&h.ctx, h.get("/build/root-abc.js?v=2")).await;
        assert_eq!(second.text().unwrap(), "js");
        assert_eq!(h.network.call_count(), 1);
    }

    #[tokio::test]
    async fn test_asset_hit_served_offline() {
        let h = Harness::new();
        h.network.route("http://localhost:3000/icons/favicon-196x196.png", StatusCode::OK, "png");
        respond_with(&h.ctx, h.get("/icons/favicon-196x196.png")).await;

        h.network.set_offline(true);
        let mut response = respond_with(&h.ctx, h.get("/icons/favicon-196x196.png")).await;
        assert_eq!(response.text().unwrap(), "png");
    }

    #[tokio::test]
    async fn test_asset_404_never_cached() {
        let h = Harness::new();

        let first = respond_with(&h.ctx, h.get("/build/missing.js")).await;
        assert_eq!(first.status(), StatusCode::NOT_FOUND);

        let second = respond_with(&h.ctx, h.get("/build/missing.js")).await;
        assert_eq!(second.status(), StatusCode::NOT_FOUND);
        assert_eq!(h.network.call_count(), 2);

        let cached = h
            .ctx
            .registry
            .match_in(ASSET_CACHE, &h.get("/build/missing.js"), MatchOptions::LOOSE)
            .await
            .unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_data_network_first_stores_and_falls_back() {
        let h = Harness::new();
        let url = "http://localhost:3000/?_data=routes%2Findex";
        h.network.route(url, StatusCode::OK, r#"{"saint":"Luke"}"#);

        let mut live = respond_with(&h.ctx, h.get("/?_data=routes%2Findex")).await;
        assert_eq!(live.text().unwrap(), r#"{"saint":"Luke"}"#);
        assert!(live.headers().get(WORKER_HEADER).is_none());

        h.network.set_offline(true);
        let mut fallback = respond_with(&h.ctx, h.get("/?_data=routes%2Findex")).await;
        assert_eq!(fallback.status(), StatusCode::OK);
        assert_eq!(fallback.headers().get(WORKER_HEADER).unwrap(), "yes");
        assert!(fallback.headers().get(CATCH_HEADER).is_none());
        assert_eq!(fallback.text().unwrap(), r#"{"saint":"Luke"}"#);
    }

    #[tokio::test]
    async fn test_data_fallback_is_exact_url() {
        let h = Harness::new();
        h.network.route("http://localhost:3000/?_data=root", StatusCode::OK, "{}");
        respond_with(&h.ctx, h.get("/?_data=root")).await;

        h.network.set_offline(true);
        let response = respond_with(&h.ctx, h.get("/?_data=root&page=2")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_data_unseen_offline_synthesizes_error() {
        let h = Harness::new();
        h.network.set_offline(true);

        let mut response = respond_with(&h.ctx, h.get("/support?_data=routes%2Fsupport")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers().get(CATCH_HEADER).unwrap(), "yes");
        assert_eq!(response.headers().get(WORKER_HEADER).unwrap(), "yes");

        let body: serde_json::Value = serde_json::from_str(&response.text().unwrap()).unwrap();
        assert_eq!(body, json!({ "message": "Network Error" }));
    }

    #[tokio::test]
    async fn test_data_error_status_is_not_a_network_failure() {
        let h = Harness::new();
        h.network.route("http://localhost:3000/?_data=root", StatusCode::SERVICE_UNAVAILABLE, "down");

        let response = respond_with(&h.ctx, h.get("/?_data=root")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get(WORKER_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_document_network_first() {
        let h = Harness::new();
        h.network.route("http://localhost:3000/support", StatusCode::OK, "<html>support</html>");

        let mut live = respond_with(&h.ctx, h.navigate("/support")).await;
        assert_eq!(live.text().unwrap(), "<html>support</html>");

        h.network.set_offline(true);
        let mut fallback = respond_with(&h.ctx, h.navigate("/support")).await;
        assert_eq!(fallback.text().unwrap(), "<html>support</html>");
        assert!(fallback.headers().get(WORKER_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_document_uncached_offline_propagates() {
        let h = Harness::new();
        h.network.set_offline(true);

        let result = handle_fetch(&h.ctx, h.navigate("/privacyPolicy")).await;
        assert!(matches!(result, Err(ref e) if e.is_network()));
    }

    #[tokio::test]
    async fn test_containment_yields_empty_response() {
        let h = Harness::new();
        h.network.set_offline(true);

        let mut response = respond_with(&h.ctx, h.navigate("/privacyPolicy")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.bytes().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_passthrough_not_cached() {
        let h = Harness::new();
        h.network.route("http://localhost:3000/persistPushSubscription", StatusCode::OK, "{}");

        let post = h.get("/persistPushSubscription").with_method(Method::POST);
        let response = respond_with(&h.ctx, post).await;
        assert_eq!(response.status(), StatusCode::OK);

        let plain = respond_with(&h.ctx, h.get("/vapidPublicKey")).await;
        assert_eq!(plain.status(), StatusCode::NOT_FOUND);

        assert!(h.ctx.registry.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_asset_lookup_failure_falls_through_to_network() {
        let (h, backend) = failing();
        h.network.route("http://localhost:3000/build/root-abc.js", StatusCode::OK, "js");
        respond_with(&h.ctx, h.get("/build/root-abc.js")).await;
        backend.fail_lookups();

        let mut response = respond_with(&h.ctx, h.get("/build/root-abc.js")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().unwrap(), "js");
        assert_eq!(h.network.call_count(), 2);
    }

    #[tokio::test]
    async fn test_asset_store_failure_still_returns_network_response() {
        let (h, backend) = failing();
        backend.fail_stores();
        h.network.route("http://localhost:3000/build/root-abc.js", StatusCode::OK, "js");

        let mut response = respond_with(&h.ctx, h.get("/build/root-abc.js")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().unwrap(), "js");

        respond_with(&h.ctx, h.get("/build/root-abc.js")).await;
        assert_eq!(h.network.call_count(), 2);
    }

    #[tokio::test]
    async fn test_data_store_failure_still_returns_network_response() {
        let (h, backend) = failing();
        backend.fail_stores();
        h.network.route("http://localhost:3000/?_data=root", StatusCode::OK, r#"{"saint":"Luke"}"#);

        let mut response = respond_with(&h.ctx, h.get("/?_data=root")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().unwrap(), r#"{"saint":"Luke"}"#);
        assert!(response.headers().get(WORKER_HEADER).is_none());

        h.network.set_offline(true);
        let fallback = respond_with(&h.ctx, h.get("/?_data=root")).await;
        assert_eq!(fallback.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_document_store_failure_still_returns_network_response() {
        let (h, backend) = failing();
        backend.fail_stores();
        h.network.route("http://localhost:3000/support", StatusCode::OK, "<html>support</html>");

        let mut response = respond_with(&h.ctx, h.navigate("/support")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.text().unwrap(), "<html>support</html>");
    }

    #[tokio::test]
    async fn test_data_lookup_failure_offline_synthesizes_error() {
        let (h, backend) = failing();
        h.network.route("http://localhost:3000/?_data=root", StatusCode::OK, "{}");
        respond_with(&h.ctx, h.get("/?_data=root")).await;

        backend.fail_lookups();
        h.network.set_offline(true);
        let response = respond_with(&h.ctx, h.get("/?_data=root")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers().get(CATCH_HEADER).unwrap(), "yes");
    }
}
