//! In-memory event sink for testing.
//!
//! Captures every notification the registry emits so tests can assert on
//! them.
//!
//! # Security Note
//!
//! This adapter is for **testing only**. It uses `.expect()` on lock
//! operations which will panic if the lock is poisoned. Production wiring
//! uses [`super::ChannelEventSink`].

use std::sync::Mutex;

use crate::domain::backpressure::ConnectionEvent;
use crate::ports::ConnectionEventSink;

/// Event sink that records notifications in order.
///
/// # Example
///
/// ```ignore
/// let sink = Arc::new(RecordingEventSink::new());
/// let registry = ConnectionRegistry::new(sink.clone());
///
/// registry.update(&id, MAX_BYTES + 1);
/// assert_eq!(sink.disconnect_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<ConnectionEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// All notifications received so far, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn events(&self) -> Vec<ConnectionEvent> {
        self.events
            .lock()
            .expect("RecordingEventSink: events lock poisoned")
            .clone()
    }

    pub fn warning_count(&self) -> usize {
        self.events().iter().filter(|e| e.is_warning()).count()
    }

    pub fn disconnect_count(&self) -> usize {
        self.events().iter().filter(|e| e.is_disconnect()).count()
    }
}

impl ConnectionEventSink for RecordingEventSink {
    fn notify(&self, event: ConnectionEvent) {
        self.events
            .lock()
            .expect("RecordingEventSink: events lock poisoned")
            .push(event);
    }
}
