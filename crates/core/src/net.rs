//! Request and response model.
//!
//! A [`Request`] is immutable per interception and cheap to clone; the fetch
//! strategies clone it whenever it is needed twice (once for the network and
//! once as the cache key).
//!
//! A [`Response`] is single-consumption: its body can be read exactly once.
//! Storing a response and also returning it requires taking a copy with
//! [`Response::try_clone`] *before* either side reads the body. A second read
//! fails with [`Error::BodyConsumed`] instead of silently yielding nothing.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// How the browser issued a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// A full-page, browser-initiated navigation.
    Navigate,
    SameOrigin,
    NoCors,
    #[default]
    Cors,
}

/// An intercepted request.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub mode: RequestMode,
    pub headers: HeaderMap,
}

impl Request {
    /// A plain `GET` sub-resource request.
    pub fn get(url: Url) -> Self {
        Self { url, method: Method::GET, mode: RequestMode::default(), headers: HeaderMap::new() }
    }

    /// A `GET` issued by a full-page navigation.
    pub fn navigate(url: Url) -> Self {
        Self { mode: RequestMode::Navigate, ..Self::get(url) }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Case-insensitive method comparison.
    pub fn is_method(&self, method: &Method) -> bool {
        self.method.as_str().eq_ignore_ascii_case(method.as_str())
    }
}

/// A response whose body may be consumed at most once.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: Some(body.into()) }
    }

    /// A `200 OK` response with no headers.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, HeaderMap::new(), body)
    }

    /// A JSON response with `Content-Type: application/json; charset=utf-8`.
    pub fn json<T: Serialize>(value: &T, status: StatusCode) -> Result<Self, Error> {
        let body = serde_json::to_vec(value)?;
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
        Ok(Self::new(status, headers, body))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Whether the body has already been read.
    pub fn body_used(&self) -> bool {
        self.body.is_none()
    }

    /// Take an independent readable copy of this response.
    ///
    /// Fails if the body has already been consumed.
    pub fn try_clone(&self) -> Result<Self, Error> {
        let body = self.body.clone().ok_or(Error::BodyConsumed)?;
        Ok(Self { status: self.status, headers: self.headers.clone(), body: Some(body) })
    }

    /// Read the body, consuming it.
    pub fn bytes(&mut self) -> Result<Bytes, Error> {
        self.body.take().ok_or(Error::BodyConsumed)
    }

    /// Read the body as UTF-8 text (lossy), consuming it.
    pub fn text(&mut self) -> Result<String, Error> {
        let bytes = self.bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Default for Response {
    /// The empty `200` response handed to the page when interception produced nothing.
    fn default() -> Self {
        Self::new(StatusCode::OK, HeaderMap::new(), Bytes::new())
    }
}
