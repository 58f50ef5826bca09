//! Capability interfaces the worker depends on.
//!
//! The real host binds these to an HTTP client and to whatever surface shows
//! notifications; tests bind them to scripted fakes and recorders.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::net::{Request, Response};

/// Outbound network access.
#[async_trait]
pub trait Network: Send + Sync {
    /// Send a request.
    ///
    /// Transport failures are reported as [`Error::Network`]. Any HTTP status,
    /// including 4xx and 5xx, is a successful fetch.
    async fn fetch(&self, request: Request) -> Result<Response, Error>;
}

/// Notification permission state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// Not decided yet; asking is allowed.
    Prompt,
    /// The platform has no notification capability.
    Unsupported,
}

/// Options for a displayed notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub vibrate: Vec<u32>,
}

/// User-facing notification capability.
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn query_permission(&self) -> Permission;

    async fn request_permission(&self) -> Permission;

    async fn show(&self, title: &str, options: &NotificationOptions) -> Result<(), Error>;
}

/// Lifecycle hooks of the worker's own registration.
#[async_trait]
pub trait WorkerScope: Send + Sync {
    /// Activate immediately instead of waiting for old instances to finish.
    async fn skip_waiting(&self) -> Result<(), Error>;

    /// Take control of every open page without a reload.
    async fn claim_clients(&self) -> Result<(), Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_serialization() {
        assert_eq!(serde_json::to_string(&Permission::Granted).unwrap(), r#""granted""#);
        let prompt: Permission = serde_json::from_str(r#""prompt""#).unwrap();
        assert_eq!(prompt, Permission::Prompt);
    }
}
