//! A single connection's backpressure counters.

use serde::Serialize;

use crate::domain::foundation::{ConnectionId, Timestamp};

use super::thresholds::BufferHealth;

/// Bookkeeping for one live connection.
///
/// Owned by the accountant; callers only ever see clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    id: ConnectionId,
    connected_at: Timestamp,
    outstanding_bytes: u64,
    messages_sent: u64,
    last_message_at: Option<Timestamp>,
    #[serde(skip)]
    overflow_signaled: bool,
}

/// Result of a mutation against a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferAssessment {
    /// Outstanding bytes after the mutation.
    pub outstanding_bytes: u64,
    /// Band the connection is now in.
    pub health: BufferHealth,
    /// True only for the first mutation of an overflow episode.
    pub overflow_entered: bool,
}

impl BufferAssessment {
    /// Whether the connection is above `MAX_BYTES`.
    pub fn disconnect_required(&self) -> bool {
        self.health == BufferHealth::Overflow
    }
}

impl ConnectionRecord {
    /// Fresh record with nothing outstanding.
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            connected_at: Timestamp::now(),
            outstanding_bytes: 0,
            messages_sent: 0,
            last_message_at: None,
            overflow_signaled: false,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    pub fn outstanding_bytes(&self) -> u64 {
        self.outstanding_bytes
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent
    }

    pub fn last_message_at(&self) -> Option<Timestamp> {
        self.last_message_at
    }

    /// Current health band.
    pub fn health(&self) -> BufferHealth {
        BufferHealth::classify(self.outstanding_bytes)
    }

    /// Outstanding bytes strictly above `MAX_BYTES`.
    pub fn should_disconnect(&self) -> bool {
        self.health() == BufferHealth::Overflow
    }

    /// Overwrite outstanding bytes with a transport-reported queue depth.
    pub fn apply_update(&mut self, new_size: u64) -> BufferAssessment {
        self.outstanding_bytes = new_size;
        self.assess()
    }

    /// Account for one message handed to the transport.
    pub fn apply_send(&mut self, message_bytes: u64) -> BufferAssessment {
        self.outstanding_bytes = self.outstanding_bytes.saturating_add(message_bytes);
        self.messages_sent += 1;
        self.last_message_at = Some(Timestamp::now());
        self.assess()
    }

    /// Account for bytes the transport confirmed written. Clamps at zero.
    pub fn apply_drain(&mut self, drained_bytes: u64) -> BufferAssessment {
        self.outstanding_bytes = self.outstanding_bytes.saturating_sub(drained_bytes);
        self.assess()
    }

    fn assess(&mut self) -> BufferAssessment {
        let health = self.health();
        let overflow_entered = health == BufferHealth::Overflow && !self.overflow_signaled;
        self.overflow_signaled = health == BufferHealth::Overflow;

        BufferAssessment {
            outstanding_bytes: self.outstanding_bytes,
            health,
            overflow_entered,
        }
    }
}
