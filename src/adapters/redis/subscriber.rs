//! Redis pub/sub subscriber feeding upstream transactions to the relay.
//!
//! Subscribes to the configured channel and hands every payload to the
//! [`TransactionRelay`]. When the connection drops it reconnects with
//! exponential backoff; the attempt counter resets after every successful
//! subscribe.

use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::watch;

use crate::application::TransactionRelay;
use crate::config::RedisConfig;

/// Errors from the upstream subscription.
#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Max reconnection attempts ({0}) exceeded")]
    ReconnectAttemptsExceeded(u32),
}

/// Why a subscription session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Shutdown,
    StreamClosed,
}

/// Long-running subscriber for the upstream transaction channel.
pub struct RedisSubscriber {
    client: redis::Client,
    config: RedisConfig,
    relay: Arc<TransactionRelay>,
}

impl RedisSubscriber {
    /// Create a subscriber. Fails only if the URL cannot be parsed.
    pub fn new(config: RedisConfig, relay: Arc<TransactionRelay>) -> Result<Self, SubscriberError> {
        let client = redis::Client::open(config.url.as_str())?;
        Ok(Self {
            client,
            config,
            relay,
        })
    }

    /// Consume the channel until `shutdown` flips or reconnects are exhausted.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), SubscriberError> {
        let mut attempt: u32 = 0;

        loop {
            match self.session(&mut shutdown, &mut attempt).await {
                Ok(SessionEnd::Shutdown) => {
                    tracing::info!("Redis subscriber stopped");
                    return Ok(());
                }
                Ok(SessionEnd::StreamClosed) => {
                    tracing::warn!(channel = %self.config.channel, "Redis subscription closed");
                }
                Err(e) => {
                    tracing::warn!(channel = %self.config.channel, error = %e, "Redis subscription failed");
                }
            }

            if attempt >= self.config.max_reconnect_attempts {
                tracing::error!(attempts = attempt, "Giving up on Redis reconnection");
                return Err(SubscriberError::ReconnectAttemptsExceeded(attempt));
            }

            let delay = self.config.backoff_delay(attempt);
            attempt += 1;
            tracing::info!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Reconnecting to Redis"
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        tracing::info!("Redis subscriber stopped");
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn session(
        &self,
        shutdown: &mut watch::Receiver<bool>,
        attempt: &mut u32,
    ) -> Result<SessionEnd, SubscriberError> {
        let mut pubsub = self.client.get_async_connection().await?.into_pubsub();
        pubsub.subscribe(&self.config.channel).await?;
        *attempt = 0;
        tracing::info!(channel = %self.config.channel, "Subscribed to upstream channel");

        let mut messages = pubsub.on_message();
        loop {
            tokio::select! {
                message = messages.next() => {
                    let Some(message) = message else {
                        return Ok(SessionEnd::StreamClosed);
                    };
                    // Rejections are logged and counted by the relay.
                    let _ = self.relay.relay(message.get_payload_bytes());
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        return Ok(SessionEnd::Shutdown);
                    }
                }
            }
        }
    }
}
