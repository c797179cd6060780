//! Broadcast fan-out.
//!
//! Delivers one pre-serialized message to every registered connection.
//! The message is encoded once; every connection shares the same buffer and
//! is charged the same byte count.
//!
//! Each send is enqueued and accounted inside that connection's record lock,
//! so a connection's frames are queued in the order they are accounted and
//! the writer can never drain bytes that were not yet counted. There is no
//! lock across connections: a reply to one client does not wait on a
//! broadcast to the others. A connection that is not writable is skipped
//! without any accounting. A connection whose send fails is counted as a
//! failure and the loop moves on.

use std::sync::Arc;

use crate::domain::foundation::ConnectionId;
use crate::domain::messages::SerializedMessage;
use crate::ports::{Transport, TransportError};

use super::registry::ConnectionRegistry;

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections registered when the broadcast started.
    pub attempted: usize,
    /// Sends handed to the transport and accounted.
    pub delivered: usize,
    /// Connections skipped because they were not writable.
    pub skipped: usize,
    /// Sends the transport rejected.
    pub failed: usize,
    /// Delivered sends that left the connection above `MAX_BYTES`.
    pub overflowed: usize,
}

/// Outcome of a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sent and accounted. `overflowed` is the registry's disconnect verdict.
    Sent { overflowed: bool },
    /// Connection was not open; nothing was sent or accounted.
    Skipped,
}

/// Fans serialized messages out to registered connections.
pub struct BroadcastFanOut {
    registry: Arc<ConnectionRegistry>,
    transport: Arc<dyn Transport>,
}

impl BroadcastFanOut {
    pub fn new(registry: Arc<ConnectionRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Send `message` to every connection registered at the start of the call.
    pub fn broadcast(&self, message: &SerializedMessage) -> BroadcastReport {
        let ids = self.registry.list_ids();
        let mut report = BroadcastReport {
            attempted: ids.len(),
            ..BroadcastReport::default()
        };

        for id in &ids {
            match self.deliver(id, message) {
                Ok(Delivery::Sent { overflowed }) => {
                    report.delivered += 1;
                    if overflowed {
                        report.overflowed += 1;
                    }
                }
                Ok(Delivery::Skipped) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(connection_id = %id, error = %e, "Broadcast send failed");
                }
            }
        }

        tracing::trace!(
            attempted = report.attempted,
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failed,
            bytes = message.byte_len(),
            "Broadcast complete"
        );

        report
    }

    /// Send `message` to a single connection with the same accounting as a
    /// broadcast.
    pub fn send_to(
        &self,
        id: &ConnectionId,
        message: &SerializedMessage,
    ) -> Result<Delivery, TransportError> {
        self.deliver(id, message)
    }

    fn deliver(
        &self,
        id: &ConnectionId,
        message: &SerializedMessage,
    ) -> Result<Delivery, TransportError> {
        if !self.transport.is_writable(id) {
            return Ok(Delivery::Skipped);
        }

        // Absent means the connection left between the check and the send.
        match self
            .registry
            .record_send_with(id, message.byte_len(), || self.transport.send(id, message))
        {
            Some(Ok(overflowed)) => Ok(Delivery::Sent { overflowed }),
            Some(Err(e)) => Err(e),
            None => Ok(Delivery::Skipped),
        }
    }
}
