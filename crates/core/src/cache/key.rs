//! URL resolution and cache key normalization.

use url::Url;

use crate::Error;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for Error {
    fn from(err: UrlError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

/// Resolve a possibly-relative URL against the worker origin.
///
/// 1. Trim leading/trailing whitespace
/// 2. Join with the origin (absolute inputs replace it)
/// 3. Reject anything but http/https
///
/// Query string and fragment are preserved.
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

/// Normalized lookup key for a cached request.
///
/// The fragment never takes part in matching. The query-less form backs the
/// `ignore_search` match option.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    url: String,
    without_search: String,
}

impl CacheKey {
    pub fn from_url(url: &Url) -> Self {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        let full = normalized.to_string();
        normalized.set_query(None);
        Self { url: full, without_search: normalized.to_string() }
    }

    /// Absolute URL without fragment.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Absolute URL without fragment or query string.
    pub fn without_search(&self) -> &str {
        &self.without_search
    }
}
