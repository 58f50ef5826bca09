//! Request classification.
//!
//! Every intercepted request falls into exactly one [`RequestKind`]. The
//! predicates are checked in a fixed order (asset, data, document) so any
//! accidental overlap resolves the same way every time.

use http::Method;

use crate::net::{Request, RequestMode};

/// URL path prefixes served as immutable static files.
pub const ASSET_PREFIXES: &[&str] = &["/build/", "/icons/"];

/// Query parameter marking a route data (loader) request.
pub const DATA_PARAM: &str = "_data";

/// Caching category of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Asset,
    DataFetch,
    DocumentNavigation,
    /// Non-GET, or a GET matching none of the above. Never cached.
    Other,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Asset => "asset",
            RequestKind::DataFetch => "data",
            RequestKind::DocumentNavigation => "document",
            RequestKind::Other => "other",
        }
    }
}

/// Classify a request.
pub fn classify(request: &Request) -> RequestKind {
    if is_asset_request(request) {
        RequestKind::Asset
    } else if is_data_request(request) {
        RequestKind::DataFetch
    } else if is_document_request(request) {
        RequestKind::DocumentNavigation
    } else {
        RequestKind::Other
    }
}

pub fn is_asset_request(request: &Request) -> bool {
    let path = request.url.path();
    request.is_method(&Method::GET) && ASSET_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

/// A GET whose query carries a non-empty data marker.
pub fn is_data_request(request: &Request) -> bool {
    request.is_method(&Method::GET)
        && request
            .url
            .query_pairs()
            .any(|(key, value)| key == DATA_PARAM && !value.is_empty())
}

pub fn is_document_request(request: &Request) -> bool {
    request.is_method(&Method::GET) && request.mode == RequestMode::Navigate
}
