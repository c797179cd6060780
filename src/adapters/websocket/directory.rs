//! Socket directory - the `Transport` implementation for live WebSockets.
//!
//! Each accepted socket gets an entry holding:
//! - an unbounded outbound queue drained by the socket's writer task
//! - a close signal the writer task watches
//!
//! Outbound frames are shared `Arc<str>` buffers, so a broadcast to N
//! sockets enqueues N pointers to one encoded message.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, watch};

use crate::domain::backpressure::DisconnectReason;
use crate::domain::foundation::ConnectionId;
use crate::domain::messages::SerializedMessage;
use crate::ports::{Transport, TransportError};

/// Receiving side of a socket's outbound queue.
pub type OutboundReceiver = mpsc::UnboundedReceiver<Arc<str>>;

/// Close signal observed by a socket's writer task. `None` while open.
pub type CloseSignal = watch::Receiver<Option<DisconnectReason>>;

struct SocketHandle {
    outbound: mpsc::UnboundedSender<Arc<str>>,
    close: watch::Sender<Option<DisconnectReason>>,
}

impl SocketHandle {
    fn is_closing(&self) -> bool {
        self.close.borrow().is_some() || self.outbound.is_closed()
    }
}

/// Directory of live sockets keyed by connection id.
#[derive(Default)]
pub struct SocketDirectory {
    sockets: DashMap<ConnectionId, SocketHandle>,
}

impl SocketDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the outbound queue and close signal for a new socket.
    ///
    /// Attaching an id twice replaces the earlier entry.
    pub fn attach(&self, id: ConnectionId) -> (OutboundReceiver, CloseSignal) {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (close, close_rx) = watch::channel(None);
        self.sockets.insert(id, SocketHandle { outbound, close });
        (outbound_rx, close_rx)
    }

    /// Drop the entry for a socket whose tasks have finished.
    pub fn detach(&self, id: &ConnectionId) {
        self.sockets.remove(id);
    }
}

impl Transport for SocketDirectory {
    fn is_writable(&self, id: &ConnectionId) -> bool {
        self.sockets
            .get(id)
            .map(|handle| !handle.is_closing())
            .unwrap_or(false)
    }

    fn send(&self, id: &ConnectionId, message: &SerializedMessage) -> Result<(), TransportError> {
        let handle = self.sockets.get(id).ok_or(TransportError::NotFound(*id))?;
        if handle.close.borrow().is_some() {
            return Err(TransportError::Closed(*id));
        }
        handle
            .outbound
            .send(message.shared_text())
            .map_err(|_| TransportError::Closed(*id))
    }

    fn close(&self, id: &ConnectionId, reason: &DisconnectReason) {
        let Some(handle) = self.sockets.get(id) else {
            return;
        };
        // First reason wins; later requests for the same socket are ignored.
        handle.close.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason.clone());
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::messages::{make_heartbeat, serialize, WireMessage};

    fn message() -> SerializedMessage {
        serialize(&WireMessage::from(make_heartbeat())).unwrap()
    }

    #[test]
    fn send_enqueues_shared_frame() {
        let directory = SocketDirectory::new();
        let id = ConnectionId::new();
        let (mut outbound, _close) = directory.attach(id);
        let message = message();

        directory.send(&id, &message).unwrap();

        let frame = outbound.try_recv().unwrap();
        assert_eq!(&*frame, message.as_str());
    }

    #[test]
    fn send_to_unknown_id_is_not_found() {
        let directory = SocketDirectory::new();
        let id = ConnectionId::new();

        assert!(matches!(
            directory.send(&id, &message()),
            Err(TransportError::NotFound(_))
        ));
        assert!(!directory.is_writable(&id));
    }

    #[test]
    fn closed_socket_is_not_writable_and_rejects_sends() {
        let directory = SocketDirectory::new();
        let id = ConnectionId::new();
        let (_outbound, close) = directory.attach(id);

        directory.close(&id, &DisconnectReason::BufferOverflow);

        assert!(!directory.is_writable(&id));
        assert!(matches!(
            directory.send(&id, &message()),
            Err(TransportError::Closed(_))
        ));
        assert_eq!(*close.borrow(), Some(DisconnectReason::BufferOverflow));
    }

    #[test]
    fn first_close_reason_wins() {
        let directory = SocketDirectory::new();
        let id = ConnectionId::new();
        let (_outbound, close) = directory.attach(id);

        directory.close(&id, &DisconnectReason::BufferOverflow);
        directory.close(&id, &DisconnectReason::ServerShutdown);

        assert_eq!(*close.borrow(), Some(DisconnectReason::BufferOverflow));
    }

    #[test]
    fn dropped_writer_makes_socket_unwritable() {
        let directory = SocketDirectory::new();
        let id = ConnectionId::new();
        let (outbound, _close) = directory.attach(id);

        drop(outbound);

        assert!(!directory.is_writable(&id));
    }

    #[test]
    fn detach_removes_entry() {
        let directory = SocketDirectory::new();
        let id = ConnectionId::new();
        let _channels = directory.attach(id);

        directory.detach(&id);

        assert!(!directory.is_writable(&id));
        assert!(matches!(
            directory.send(&id, &message()),
            Err(TransportError::NotFound(_))
        ));
        directory.close(&id, &DisconnectReason::ServerShutdown);
    }
}
