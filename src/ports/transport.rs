//! Transport port - The socket layer as seen by the fan-out.
//!
//! Implementations hand bytes to a per-connection outbound queue and return
//! immediately; the actual socket write happens elsewhere and is reported
//! back through `ConnectionRegistry::record_drain`.

use thiserror::Error;

use crate::domain::backpressure::DisconnectReason;
use crate::domain::foundation::ConnectionId;
use crate::domain::messages::SerializedMessage;

/// Errors from handing a message to a connection.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No socket is attached for this id
    #[error("No socket for connection {0}")]
    NotFound(ConnectionId),

    /// The socket is closing or closed
    #[error("Connection {0} is closed")]
    Closed(ConnectionId),
}

/// Outbound side of the client sockets.
///
/// # Contract
///
/// - `send` never blocks on I/O and preserves call order per connection
/// - `close` is idempotent and safe for unknown ids
pub trait Transport: Send + Sync {
    /// Whether the connection can currently accept messages.
    fn is_writable(&self, id: &ConnectionId) -> bool;

    /// Queue a message for the connection.
    fn send(&self, id: &ConnectionId, message: &SerializedMessage) -> Result<(), TransportError>;

    /// Ask the socket to close.
    fn close(&self, id: &ConnectionId, reason: &DisconnectReason);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_trait_is_object_safe_and_send_sync() {
        fn _assert_trait_object(_: &dyn Transport) {}
        fn _assert_arc_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_arc_send_sync::<std::sync::Arc<dyn Transport>>();
    }

    #[test]
    fn transport_error_display() {
        let id = ConnectionId::new();
        assert!(TransportError::Closed(id).to_string().contains(&id.to_string()));
        assert!(TransportError::NotFound(id).to_string().starts_with("No socket"));
    }
}
