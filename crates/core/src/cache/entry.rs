//! Stored form of a cached response.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::net::{Request, Response};

/// A request header value captured at store time for `Vary` matching.
///
/// A name of `*` matches nothing unless vary checks are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaryField {
    pub name: String,
    pub value: Option<String>,
}

/// A cached response, detached from any body stream.
///
/// Header values are kept as raw bytes; not every value is UTF-8.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResponse {
    pub status: u16,
    pub headers: Vec<(String, Vec<u8>)>,
    pub body: Bytes,
    pub vary: Vec<VaryField>,
    pub stored_at: String,
}

impl StoredResponse {
    /// Capture a response for storage, consuming its body.
    ///
    /// Callers that also hand the response to the page must clone first.
    pub fn capture(request: &Request, mut response: Response) -> Result<Self, Error> {
        let body = response.bytes()?;

        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
            .collect();

        let vary = response
            .headers()
            .get_all(header::VARY)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(|name| name.trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .map(|name| {
                let value = request
                    .headers
                    .get(name.as_str())
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                VaryField { name, value }
            })
            .collect();

        Ok(Self {
            status: response.status().as_u16(),
            headers,
            body,
            vary,
            stored_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Rebuild a fresh, unconsumed response.
    pub fn to_response(&self) -> Result<Response, Error> {
        let status = StatusCode::from_u16(self.status).map_err(|e| Error::Cache(e.to_string()))?;

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::Cache(e.to_string()))?;
            let value = HeaderValue::from_bytes(value).map_err(|e| Error::Cache(e.to_string()))?;
            headers.append(name, value);
        }

        Ok(Response::new(status, headers, self.body.clone()))
    }

    /// Whether `request` carries the same values for every varied header.
    pub fn matches_vary(&self, request: &Request) -> bool {
        self.vary.iter().all(|field| {
            if field.name == "*" {
                return false;
            }
            let current = request.headers.get(field.name.as_str()).and_then(|v| v.to_str().ok());
            current == field.value.as_deref()
        })
    }
}
