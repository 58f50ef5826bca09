//! Server-side push sending.
//!
//! Reads the subscription saved by the page, encrypts a [`PushContent`]
//! payload for it and signs the request with the VAPID keys from
//! [`PushConfig`].

use async_trait::async_trait;
use web_push::{
    ContentEncoding, IsahcWebPushClient, SubscriptionInfo, VapidSignatureBuilder, WebPushClient, WebPushError,
    WebPushMessageBuilder,
};

use sotd_core::store::SUBSCRIPTION_KEY;
use sotd_core::{ConfigError, Error, PushConfig, PushContent, SubscriptionStore};

/// Seconds the push service keeps an undelivered message.
const TTL_SECONDS: u32 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no push subscription has been saved")]
    NoSubscription,

    #[error("stored push subscription is malformed: {0}")]
    InvalidSubscription(#[from] serde_json::Error),

    #[error("failed to read push subscription: {0}")]
    Store(#[from] Error),

    #[error("push service rejected the message: {0}")]
    Send(#[from] WebPushError),
}

/// Delivers an already-serialized payload to one subscription.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, subscription: &SubscriptionInfo, payload: &[u8]) -> Result<(), PushError>;
}

/// [`PushTransport`] that talks to the browser's push service.
pub struct WebPushSender {
    client: IsahcWebPushClient,
    private_key: String,
    subject: String,
}

impl WebPushSender {
    pub fn new(config: &PushConfig) -> Result<Self, PushError> {
        let private_key = config.private_key()?.to_string();
        Ok(Self { client: IsahcWebPushClient::new()?, private_key, subject: config.vapid_subject.clone() })
    }
}

#[async_trait]
impl PushTransport for WebPushSender {
    async fn send(&self, subscription: &SubscriptionInfo, payload: &[u8]) -> Result<(), PushError> {
        let mut signature = VapidSignatureBuilder::from_base64(&self.private_key, web_push::URL_SAFE_NO_PAD, subscription)?;
        signature.add_claim("sub", self.subject.as_str());

        let mut message = WebPushMessageBuilder::new(subscription);
        message.set_ttl(TTL_SECONDS);
        message.set_payload(ContentEncoding::Aes128Gcm, payload);
        message.set_vapid_signature(signature.build()?);
        let message = message.build()?;

        self.client.send(message).await?;
        Ok(())
    }
}

/// Send `content` to the saved subscription.
pub async fn send_stored(
    store: &dyn SubscriptionStore,
    transport: &dyn PushTransport,
    content: &PushContent,
) -> Result<(), PushError> {
    store.init().await?;
    let stored = store.get(SUBSCRIPTION_KEY).await?.ok_or(PushError::NoSubscription)?;
    let subscription: SubscriptionInfo = serde_json::from_value(stored)?;
    let payload = serde_json::to_vec(content)?;

    tracing::info!(endpoint = %subscription.endpoint, title = %content.title, "sending push notification");
    transport.send(&subscription, &payload).await
}
