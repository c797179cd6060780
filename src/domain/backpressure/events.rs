//! Connection lifecycle notifications.

use std::fmt;

use crate::domain::foundation::ConnectionId;

/// Why a connection was (or must be) disconnected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Outstanding bytes exceeded `MAX_BYTES`.
    BufferOverflow,
    /// The process is shutting down.
    ServerShutdown,
    /// Externally-driven close (client close, socket error, auth revocation).
    Other(String),
}

impl DisconnectReason {
    /// Build a caller-supplied reason.
    pub fn other(reason: impl Into<String>) -> Self {
        DisconnectReason::Other(reason.into())
    }

    /// Wire/log representation of the reason.
    pub fn as_str(&self) -> &str {
        match self {
            DisconnectReason::BufferOverflow => "buffer_overflow",
            DisconnectReason::ServerShutdown => "server_shutdown",
            DisconnectReason::Other(reason) => reason,
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification emitted by the connection registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Outstanding bytes landed in the warning band.
    Warning { id: ConnectionId, size: u64 },
    /// The connection must be (or has been) closed.
    Disconnect {
        id: ConnectionId,
        reason: DisconnectReason,
    },
}

impl ConnectionEvent {
    /// The connection this event concerns.
    pub fn connection_id(&self) -> &ConnectionId {
        match self {
            ConnectionEvent::Warning { id, .. } => id,
            ConnectionEvent::Disconnect { id, .. } => id,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ConnectionEvent::Warning { .. })
    }

    pub fn is_disconnect(&self) -> bool {
        matches!(self, ConnectionEvent::Disconnect { .. })
    }
}
