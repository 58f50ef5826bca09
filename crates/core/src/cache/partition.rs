//! A handle on one named cache partition.

use std::sync::Arc;

use http::Method;
use url::Url;

use super::backend::CacheBackend;
use super::entry::StoredResponse;
use super::key::CacheKey;
use crate::Error;
use crate::net::{Request, Response};
use crate::ports::Network;

/// Matching relaxations for [`Partition::match_request`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Compare URLs without their query string.
    pub ignore_search: bool,
    /// Skip the `Vary` header comparison.
    pub ignore_vary: bool,
}

impl MatchOptions {
    /// Exact URL, vary-aware matching.
    pub const EXACT: Self = Self { ignore_search: false, ignore_vary: false };

    /// Matching used for static assets: the same physical file may be
    /// requested with or without irrelevant query parameters.
    pub const LOOSE: Self = Self { ignore_search: true, ignore_vary: true };
}

/// Handle on a named partition. Cheap to clone.
#[derive(Clone)]
pub struct Partition {
    name: Arc<str>,
    backend: Arc<dyn CacheBackend>,
}

impl std::fmt::Debug for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partition").field("name", &self.name).finish()
    }
}

impl Partition {
    pub(crate) fn new(name: &str, backend: Arc<dyn CacheBackend>) -> Self {
        Self { name: Arc::from(name), backend }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a fresh copy of the stored response for `request`.
    ///
    /// Only GET requests ever match.
    pub async fn match_request(&self, request: &Request, options: MatchOptions) -> Result<Option<Response>, Error> {
        if !request.is_method(&Method::GET) {
            return Ok(None);
        }

        let key = CacheKey::from_url(&request.url);
        let candidates = self.backend.lookup(&self.name, &key, options.ignore_search).await?;

        candidates
            .iter()
            .find(|entry| options.ignore_vary || entry.matches_vary(request))
            .map(StoredResponse::to_response)
            .transpose()
    }

    /// Store `response` under `request`, replacing any previous entry.
    ///
    /// Consumes the response body; clone first if the response is also
    /// returned to the page.
    pub async fn put(&self, request: &Request, response: Response) -> Result<(), Error> {
        if !request.is_method(&Method::GET) {
            return Err(Error::Cache(format!("cannot store {} request", request.method)));
        }

        let key = CacheKey::from_url(&request.url);
        let entry = StoredResponse::capture(request, response)?;
        self.backend.store(&self.name, &key, entry).await?;

        tracing::debug!(partition = %self.name, url = key.url(), "stored response");
        Ok(())
    }

    /// Fetch `url` and store the response in one step.
    ///
    /// Fails without storing anything when the status is not 2xx.
    pub async fn add(&self, network: &dyn Network, url: Url) -> Result<(), Error> {
        let request = Request::get(url);
        let response = network.fetch(request.clone()).await?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus(response.status().as_u16()));
        }

        self.put(&request, response).await
    }
}
