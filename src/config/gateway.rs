//! Gateway behaviour configuration (heartbeat, client API keys)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Seconds between heartbeat broadcasts
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    /// Comma-separated client API keys; unset accepts every client
    pub api_keys: Option<SecretString>,
}

impl GatewayConfig {
    /// Get heartbeat interval as Duration
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Configured API keys, trimmed. Empty when authentication is disabled.
    pub fn api_key_list(&self) -> Vec<SecretString> {
        self.api_keys
            .as_ref()
            .map(|keys| {
                keys.expose_secret()
                    .split(',')
                    .map(|key| SecretString::new(key.trim().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Validate gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=3600).contains(&self.heartbeat_interval_secs) {
            return Err(ValidationError::InvalidHeartbeatInterval);
        }
        if self
            .api_key_list()
            .iter()
            .any(|key| key.expose_secret().is_empty())
        {
            return Err(ValidationError::EmptyApiKey);
        }
        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval(),
            api_keys: None,
        }
    }
}

fn default_heartbeat_interval() -> u64 {
    30
}
