//! Periodic heartbeat broadcast.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::domain::messages::{make_heartbeat, serialize, CodecError, WireMessage};

use super::fan_out::{BroadcastFanOut, BroadcastReport};

/// Broadcasts a heartbeat to every connection on a fixed interval.
pub struct HeartbeatService {
    fan_out: Arc<BroadcastFanOut>,
    interval: Duration,
}

impl HeartbeatService {
    pub fn new(fan_out: Arc<BroadcastFanOut>, interval: Duration) -> Self {
        Self { fan_out, interval }
    }

    /// Broadcast a single heartbeat now.
    pub fn beat(&self) -> Result<BroadcastReport, CodecError> {
        let message = serialize(&WireMessage::from(make_heartbeat()))?;
        Ok(self.fan_out.broadcast(&message))
    }

    /// Beat every interval until `shutdown` flips to true.
    ///
    /// The first beat fires one full interval after start.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_secs = self.interval.as_secs(), "Heartbeat service started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.beat() {
                        Ok(report) => tracing::trace!(
                            delivered = report.delivered,
                            "Heartbeat broadcast"
                        ),
                        Err(e) => tracing::error!(error = %e, "Failed to encode heartbeat"),
                    }
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Heartbeat service stopped");
    }
}
