//! Channel-backed event sink and the disconnect dispatcher.
//!
//! The registry notifies synchronously while holding no lock the dispatcher
//! needs. [`ChannelEventSink`] forwards each notification onto an unbounded
//! channel and [`DisconnectDispatcher`] drains it in a background task,
//! closing sockets for disconnect requests.
//!
//! ```text
//! ConnectionRegistry ──notify──► ChannelEventSink ──mpsc──► DisconnectDispatcher
//!                                                                  │
//!                                                                  ▼ close
//!                                                              Transport
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::domain::backpressure::{ConnectionEvent, DisconnectReason};
use crate::ports::{ConnectionEventSink, Transport};

/// Event sink that forwards notifications onto an mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<ConnectionEvent>,
}

impl ChannelEventSink {
    /// Create a sink and the receiving end for a dispatcher.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ConnectionEventSink for ChannelEventSink {
    fn notify(&self, event: ConnectionEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Connection event dropped, dispatcher stopped");
        }
    }
}

/// Background task that acts on connection notifications.
///
/// `buffer_overflow` and `server_shutdown` close the socket through the
/// transport. Other disconnect reasons come from sockets that are already
/// closing and are only logged.
pub struct DisconnectDispatcher {
    events: mpsc::UnboundedReceiver<ConnectionEvent>,
    transport: Arc<dyn Transport>,
}

impl DisconnectDispatcher {
    pub fn new(
        events: mpsc::UnboundedReceiver<ConnectionEvent>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self { events, transport }
    }

    /// Handle one notification.
    pub fn dispatch(&self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Warning { id, size } => {
                tracing::debug!(connection_id = %id, outstanding_bytes = size, "Slow consumer");
            }
            ConnectionEvent::Disconnect { id, reason } => match reason {
                DisconnectReason::BufferOverflow | DisconnectReason::ServerShutdown => {
                    tracing::info!(connection_id = %id, reason = %reason, "Closing connection");
                    self.transport.close(&id, &reason);
                }
                DisconnectReason::Other(_) => {
                    tracing::debug!(connection_id = %id, reason = %reason, "Connection disconnected");
                }
            },
        }
    }

    /// Drain notifications until the channel closes or `shutdown` flips.
    ///
    /// Notifications already queued when shutdown is signalled are still
    /// dispatched, so shutdown closes reach their sockets.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Disconnect dispatcher started");

        loop {
            tokio::select! {
                maybe_event = self.events.recv() => {
                    match maybe_event {
                        Some(event) => self.dispatch(event),
                        None => break,
                    }
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        while let Ok(event) = self.events.try_recv() {
                            self.dispatch(event);
                        }
                        break;
                    }
                }
            }
        }

        tracing::info!("Disconnect dispatcher stopped");
    }
}
