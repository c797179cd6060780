//! Connection registry - the single source of truth for live connections.
//!
//! Owns the [`BufferAccountant`] and is the only way to reach it. Every
//! mutation is evaluated against the thresholds and the outcome is pushed
//! synchronously to the injected [`ConnectionEventSink`]:
//!
//! | Outcome of `update` / `record_send`      | Notification                     |
//! |------------------------------------------|----------------------------------|
//! | lands in the warning band                | `Warning` (every call)           |
//! | first call of an overflow episode        | `Disconnect(buffer_overflow)`    |
//! | still overflowing                        | none, verdict stays `true`       |
//!
//! The registry never closes sockets itself. An overflow notification is a
//! removal request; the transport closes the socket and then calls
//! [`ConnectionRegistry::remove`].

use std::sync::Arc;

use crate::domain::backpressure::{
    BufferAccountant, BufferAssessment, BufferHealth, ConnectionEvent, ConnectionRecord,
    DisconnectReason, WARNING_BYTES,
};
use crate::domain::foundation::ConnectionId;
use crate::ports::ConnectionEventSink;

/// Registry of live connections and their backpressure state.
pub struct ConnectionRegistry {
    accountant: BufferAccountant,
    sink: Arc<dyn ConnectionEventSink>,
}

impl ConnectionRegistry {
    /// Create an empty registry that reports to `sink`.
    pub fn new(sink: Arc<dyn ConnectionEventSink>) -> Self {
        Self {
            accountant: BufferAccountant::new(),
            sink,
        }
    }

    /// Register a connection. A duplicate id replaces the previous record.
    pub fn add(&self, id: ConnectionId) {
        self.accountant.open(id);
        tracing::debug!(
            connection_id = %id,
            connections = self.accountant.len(),
            "Connection registered"
        );
    }

    /// Forget a connection without notifying. Removing an absent id is a no-op.
    pub fn remove(&self, id: &ConnectionId) -> Option<ConnectionRecord> {
        let record = self.accountant.close(id)?;
        tracing::debug!(
            connection_id = %id,
            messages_sent = record.messages_sent(),
            outstanding_bytes = record.outstanding_bytes(),
            "Connection removed"
        );
        Some(record)
    }

    /// Remove a connection and emit a disconnect notification for it.
    ///
    /// Nothing is emitted when the id was already gone.
    pub fn disconnect(
        &self,
        id: &ConnectionId,
        reason: DisconnectReason,
    ) -> Option<ConnectionRecord> {
        let record = self.remove(id)?;
        self.sink.notify(ConnectionEvent::Disconnect { id: *id, reason });
        Some(record)
    }

    /// Snapshot of one connection's record.
    pub fn get(&self, id: &ConnectionId) -> Option<ConnectionRecord> {
        self.accountant.snapshot(id)
    }

    /// Ids of every registered connection at the time of the call.
    pub fn list_ids(&self) -> Vec<ConnectionId> {
        self.accountant.ids()
    }

    pub fn count(&self) -> usize {
        self.accountant.len()
    }

    /// Overwrite outstanding bytes with a transport-reported queue depth.
    ///
    /// Returns true iff the connection is now above `MAX_BYTES`.
    pub fn update(&self, id: &ConnectionId, new_size: u64) -> bool {
        self.accountant
            .update(id, new_size)
            .map(|assessment| self.signal(id, assessment))
            .unwrap_or(false)
    }

    /// Account for one message handed to the transport.
    ///
    /// Returns true iff the connection is now above `MAX_BYTES`.
    pub fn record_send(&self, id: &ConnectionId, message_bytes: u64) -> bool {
        self.accountant
            .record_send(id, message_bytes)
            .map(|assessment| self.signal(id, assessment))
            .unwrap_or(false)
    }

    /// Hand a message to the transport through `enqueue` and account for it in
    /// one step per connection.
    ///
    /// Returns `None` for unknown ids without calling `enqueue`, the enqueue
    /// error if it failed (nothing is accounted), and otherwise the same
    /// verdict as [`ConnectionRegistry::record_send`]. Notifications are
    /// emitted after the record lock is released.
    pub fn record_send_with<E>(
        &self,
        id: &ConnectionId,
        message_bytes: u64,
        enqueue: impl FnOnce() -> Result<(), E>,
    ) -> Option<Result<bool, E>> {
        self.accountant
            .record_send_with(id, message_bytes, enqueue)
            .map(|outcome| outcome.map(|assessment| self.signal(id, assessment)))
    }

    /// Account for bytes the transport wrote to the socket.
    ///
    /// Never notifies. Returns true iff the connection is still above `MAX_BYTES`.
    pub fn record_drain(&self, id: &ConnectionId, drained_bytes: u64) -> bool {
        self.accountant
            .record_drain(id, drained_bytes)
            .map(|assessment| assessment.disconnect_required())
            .unwrap_or(false)
    }

    /// Whether the connection is above `MAX_BYTES`. False for unknown ids.
    pub fn should_disconnect(&self, id: &ConnectionId) -> bool {
        self.accountant.should_disconnect(id)
    }

    /// Records with outstanding bytes strictly above `threshold_bytes`.
    pub fn connections_above(&self, threshold_bytes: u64) -> Vec<ConnectionRecord> {
        self.accountant.connections_above(threshold_bytes)
    }

    /// Connections currently above `WARNING_BYTES`.
    pub fn slow_consumers(&self) -> Vec<ConnectionRecord> {
        self.connections_above(WARNING_BYTES)
    }

    /// Remove every connection, emitting `server_shutdown` for each.
    ///
    /// Only for process teardown. Returns the number of connections removed.
    pub fn cleanup(&self) -> usize {
        let removed = self
            .list_ids()
            .iter()
            .filter(|id| {
                self.disconnect(id, DisconnectReason::ServerShutdown)
                    .is_some()
            })
            .count();

        tracing::info!(connections = removed, "Connection registry cleaned up");
        removed
    }

    fn signal(&self, id: &ConnectionId, assessment: BufferAssessment) -> bool {
        match assessment.health {
            BufferHealth::Warning => {
                tracing::warn!(
                    connection_id = %id,
                    outstanding_bytes = assessment.outstanding_bytes,
                    "Connection buffer above warning threshold"
                );
                self.sink.notify(ConnectionEvent::Warning {
                    id: *id,
                    size: assessment.outstanding_bytes,
                });
            }
            BufferHealth::Overflow if assessment.overflow_entered => {
                tracing::warn!(
                    connection_id = %id,
                    outstanding_bytes = assessment.outstanding_bytes,
                    "Connection buffer overflow, requesting disconnect"
                );
                self.sink.notify(ConnectionEvent::Disconnect {
                    id: *id,
                    reason: DisconnectReason::BufferOverflow,
                });
            }
            BufferHealth::Overflow | BufferHealth::Healthy => {}
        }

        assessment.disconnect_required()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::RecordingEventSink;
    use crate::domain::backpressure::MAX_BYTES;

    fn registry() -> (ConnectionRegistry, Arc<RecordingEventSink>) {
        let sink = Arc::new(RecordingEventSink::new());
        (ConnectionRegistry::new(sink.clone()), sink)
    }

    #[test]
    fn add_get_count_and_list() {
        let (registry, _) = registry();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        registry.add(a);
        registry.add(b);

        assert_eq!(registry.count(), 2);
        assert!(registry.get(&a).is_some());
        let ids = registry.list_ids();
        assert!(ids.contains(&a));
        assert!(ids.contains(&b));
    }

    #[test]
    fn remove_is_idempotent_and_silent() {
        let (registry, sink) = registry();
        let id = ConnectionId::new();
        registry.add(id);

        assert!(registry.remove(&id).is_some());
        assert!(registry.remove(&id).is_none());
        assert_eq!(registry.count(), 0);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn update_above_max_returns_true_at_max_false() {
        let (registry, _) = registry();
        let id = ConnectionId::new();
        registry.add(id);

        assert!(!registry.update(&id, MAX_BYTES));
        assert!(registry.update(&id, MAX_BYTES + 1));
    }

    #[test]
    fn warning_band_raises_one_warning_and_no_disconnect() {
        let (registry, sink) = registry();
        let id = ConnectionId::new();
        registry.add(id);

        registry.update(&id, WARNING_BYTES + 1);

        assert_eq!(sink.warning_count(), 1);
        assert_eq!(sink.disconnect_count(), 0);
        assert_eq!(
            sink.events(),
            vec![ConnectionEvent::Warning {
                id,
                size: WARNING_BYTES + 1
            }]
        );
    }

    #[test]
    fn overflow_raises_one_disconnect_and_no_warning() {
        let (registry, sink) = registry();
        let id = ConnectionId::new();
        registry.add(id);

        registry.update(&id, MAX_BYTES + 1);

        assert_eq!(sink.warning_count(), 0);
        assert_eq!(
            sink.events(),
            vec![ConnectionEvent::Disconnect {
                id,
                reason: DisconnectReason::BufferOverflow
            }]
        );
    }

    #[test]
    fn warning_is_reraised_on_every_call_in_band() {
        let (registry, sink) = registry();
        let id = ConnectionId::new();
        registry.add(id);

        registry.update(&id, WARNING_BYTES + 1);
        registry.update(&id, WARNING_BYTES + 2);
        registry.update(&id, MAX_BYTES);

        assert_eq!(sink.warning_count(), 3);
    }

    #[test]
    fn accumulated_sends_cross_max_and_signal_once() {
        let (registry, sink) = registry();
        let id = ConnectionId::new();
        registry.add(id);

        let verdicts: Vec<bool> = (0..100).map(|_| registry.record_send(&id, 60_000)).collect();

        assert!(registry.should_disconnect(&id));
        // 88 * 60_000 = 5_280_000 is the first total above MAX_BYTES.
        assert!(!verdicts[86]);
        assert!(verdicts[87]);
        assert!(verdicts[99]);
        assert_eq!(sink.disconnect_count(), 1);
    }

    #[test]
    fn drain_below_max_rearms_overflow_signal() {
        let (registry, sink) = registry();
        let id = ConnectionId::new();
        registry.add(id);

        registry.update(&id, MAX_BYTES + 1);
        assert!(!registry.record_drain(&id, 10));
        registry.record_send(&id, 100);

        assert_eq!(sink.disconnect_count(), 2);
    }

    #[test]
    fn drain_never_goes_negative() {
        let (registry, _) = registry();
        let id = ConnectionId::new();
        registry.add(id);

        registry.record_send(&id, 10);
        registry.record_drain(&id, 1_000);

        assert_eq!(registry.get(&id).unwrap().outstanding_bytes(), 0);
    }

    #[test]
    fn send_after_remove_is_a_silent_noop() {
        let (registry, sink) = registry();
        let id = ConnectionId::new();
        registry.add(id);
        registry.remove(&id);

        assert!(!registry.record_send(&id, MAX_BYTES * 2));
        assert!(registry.get(&id).is_none());
        assert_eq!(registry.count(), 0);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn record_send_with_signals_overflow_only_after_successful_enqueue() {
        let (registry, sink) = registry();
        let id = ConnectionId::new();
        registry.add(id);
        registry.update(&id, MAX_BYTES);

        let refused = registry.record_send_with(&id, 10, || Err(()));
        assert_eq!(refused, Some(Err(())));
        assert_eq!(sink.disconnect_count(), 0);

        let accepted = registry.record_send_with(&id, 10, || Ok::<(), ()>(()));
        assert_eq!(accepted, Some(Ok(true)));
        assert_eq!(sink.disconnect_count(), 1);
        assert_eq!(registry.get(&id).unwrap().messages_sent(), 1);
    }

    #[test]
    fn should_disconnect_false_for_unknown() {
        let (registry, _) = registry();
        assert!(!registry.should_disconnect(&ConnectionId::new()));
    }

    #[test]
    fn disconnect_emits_caller_reason_once() {
        let (registry, sink) = registry();
        let id = ConnectionId::new();
        registry.add(id);

        registry.disconnect(&id, DisconnectReason::other("client_closed"));
        registry.disconnect(&id, DisconnectReason::other("client_closed"));

        assert_eq!(
            sink.events(),
            vec![ConnectionEvent::Disconnect {
                id,
                reason: DisconnectReason::other("client_closed")
            }]
        );
    }

    #[test]
    fn cleanup_emits_server_shutdown_for_each() {
        let (registry, sink) = registry();
        for _ in 0..5 {
            registry.add(ConnectionId::new());
        }

        assert_eq!(registry.cleanup(), 5);

        assert_eq!(registry.count(), 0);
        let events = sink.events();
        assert_eq!(events.len(), 5);
        assert!(events.iter().all(|e| matches!(
            e,
            ConnectionEvent::Disconnect {
                reason: DisconnectReason::ServerShutdown,
                ..
            }
        )));
    }

    #[test]
    fn slow_consumers_lists_connections_above_warning() {
        let (registry, _) = registry();
        let fast = ConnectionId::new();
        let slow = ConnectionId::new();
        registry.add(fast);
        registry.add(slow);

        registry.update(&slow, WARNING_BYTES + 100);

        let slow_ids: Vec<ConnectionId> =
            registry.slow_consumers().iter().map(|r| *r.id()).collect();
        assert_eq!(slow_ids, vec![slow]);
    }
}
