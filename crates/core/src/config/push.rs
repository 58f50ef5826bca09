//! VAPID settings for sending pushes.
//!
//! These come from the unprefixed `VAPID_PUBLIC_KEY`, `VAPID_PRIVATE_KEY`
//! and `VAPID_SUBJECT` variables so the same environment serves the site.

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

use super::ConfigError;

const VAPID_VARS: [&str; 3] = ["VAPID_PUBLIC_KEY", "VAPID_PRIVATE_KEY", "VAPID_SUBJECT"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// URL-safe base64 application server key handed to subscribers.
    #[serde(default)]
    pub vapid_public_key: Option<String>,

    /// URL-safe base64 private key used to sign push requests.
    #[serde(default)]
    pub vapid_private_key: Option<String>,

    /// Contact claim (`sub`) placed in the VAPID token.
    #[serde(default = "default_subject")]
    pub vapid_subject: String,
}

fn default_subject() -> String {
    "https://serviceworke.rs/".into()
}

impl Default for PushConfig {
    fn default() -> Self {
        Self { vapid_public_key: None, vapid_private_key: None, vapid_subject: default_subject() }
    }
}

impl PushConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::extract(
            Figment::from(Serialized::defaults(Self::default()))
                .merge(Env::raw().only(&VAPID_VARS).map(|key| key.as_str().to_lowercase().into())),
        )
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))
    }

    pub fn public_key(&self) -> Result<&str, ConfigError> {
        present(self.vapid_public_key.as_deref(), "VAPID_PUBLIC_KEY")
    }

    pub fn private_key(&self) -> Result<&str, ConfigError> {
        present(self.vapid_private_key.as_deref(), "VAPID_PRIVATE_KEY")
    }
}

fn present<'a>(value: Option<&'a str>, var: &str) -> Result<&'a str, ConfigError> {
    match value.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(ConfigError::Missing {
            field: var.to_lowercase(),
            hint: format!("set the {var} environment variable"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_have_no_keys() {
        let config = PushConfig::default();
        assert_eq!(config.vapid_subject, "https://serviceworke.rs/");
        assert!(matches!(config.public_key(), Err(ConfigError::Missing { .. })));
        assert!(matches!(config.private_key(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_layered_keys_override_defaults() {
        let config = PushConfig::extract(
            Figment::from(Serialized::defaults(PushConfig::default()))
                .merge(Serialized::default("vapid_public_key", "BPub"))
                .merge(Serialized::default("vapid_private_key", "priv")),
        )
        .unwrap();

        assert_eq!(config.public_key().unwrap(), "BPub");
        assert_eq!(config.private_key().unwrap(), "priv");
        assert_eq!(config.vapid_subject, "https://serviceworke.rs/");
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = PushConfig { vapid_private_key: Some("  ".into()), ..Default::default() };
        assert!(matches!(config.private_key(), Err(ConfigError::Missing { .. })));
    }
}
