//! Push notification content shared by the sender and the worker.
//!
//! The wire payload is the JSON object `{"title": ..., "body": ...}`.

use serde::{Deserialize, Serialize};

use crate::ports::NotificationOptions;

pub const NOTIFICATION_ICON: &str = "/icons/favicon-196x196.png";
pub const VIBRATE_PATTERN: [u32; 5] = [100, 50, 100, 50, 100];

const NO_PAYLOAD_TITLE: &str = "No Payload";

const DAILY_TITLE: &str = "Saint Of The Day";
const DAILY_BODY: &str = "There is a new saint of the day!";

/// Title and body carried by a push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushContent {
    #[serde(default = "no_payload_title")]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

fn no_payload_title() -> String {
    NO_PAYLOAD_TITLE.to_string()
}

impl Default for PushContent {
    fn default() -> Self {
        Self { title: no_payload_title(), body: String::new() }
    }
}

impl PushContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { title: title.into(), body: body.into() }
    }

    /// The announcement sent when a new saint is up.
    pub fn daily() -> Self {
        Self::new(DAILY_TITLE, DAILY_BODY)
    }

    /// Decode a push payload. Missing or malformed payloads yield the
    /// "No Payload" notification.
    pub fn decode_payload(payload: Option<&[u8]>) -> Self {
        let Some(bytes) = payload else {
            return Self::default();
        };
        serde_json::from_slice(bytes).unwrap_or_else(|error| {
            tracing::debug!(%error, "push payload is not valid JSON");
            Self::default()
        })
    }

    pub fn options(&self) -> NotificationOptions {
        NotificationOptions {
            body: self.body.clone(),
            icon: NOTIFICATION_ICON.to_string(),
            vibrate: VIBRATE_PATTERN.to_vec(),
        }
    }
}
