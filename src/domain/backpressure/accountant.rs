//! Concurrent per-connection byte accounting.
//!
//! Records live in a [`DashMap`] keyed by connection id, each behind its own
//! `Mutex`. The map lock is held only long enough to clone the entry's `Arc`,
//! so mutations to different connections never wait on each other and a
//! broadcast touching every connection does not block joins or leaves.
//!
//! Every mutation against an unknown id returns `None` and changes nothing.
//! A mutation racing a concurrent removal lands on the detached record and is
//! dropped with it; the record is never recreated.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;

use crate::domain::foundation::ConnectionId;

use super::record::{BufferAssessment, ConnectionRecord};

type SharedRecord = Arc<Mutex<ConnectionRecord>>;

/// Outstanding-byte bookkeeping for every live connection.
///
/// Pure state: no I/O and no notifications. The connection registry wraps
/// this and turns assessments into warning/disconnect events.
#[derive(Default)]
pub struct BufferAccountant {
    records: DashMap<ConnectionId, SharedRecord>,
}

impl BufferAccountant {
    /// Create an empty accountant.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Start tracking a connection. Replaces any existing record for `id`.
    pub fn open(&self, id: ConnectionId) {
        self.records
            .insert(id, Arc::new(Mutex::new(ConnectionRecord::new(id))));
    }

    /// Stop tracking a connection, returning its final state.
    pub fn close(&self, id: &ConnectionId) -> Option<ConnectionRecord> {
        self.records
            .remove(id)
            .map(|(_, record)| lock(&record).clone())
    }

    /// Copy of the current record for `id`.
    pub fn snapshot(&self, id: &ConnectionId) -> Option<ConnectionRecord> {
        self.with_record(id, |record| record.clone())
    }

    /// Ids of all tracked connections at the time of the call.
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.records.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Overwrite outstanding bytes for `id`.
    pub fn update(&self, id: &ConnectionId, new_size: u64) -> Option<BufferAssessment> {
        self.with_record(id, |record| record.apply_update(new_size))
    }

    /// Add `message_bytes` to `id`'s outstanding bytes and count the message.
    pub fn record_send(&self, id: &ConnectionId, message_bytes: u64) -> Option<BufferAssessment> {
        self.with_record(id, |record| record.apply_send(message_bytes))
    }

    /// Run `enqueue` and, if it succeeds, account for `message_bytes` as one
    /// sent message, all under `id`'s record lock.
    ///
    /// A drain for the enqueued bytes cannot be applied before the send is
    /// counted, and sends to one connection are accounted in enqueue order.
    /// `enqueue` is not called for unknown ids. A failed enqueue leaves the
    /// record untouched.
    pub fn record_send_with<E>(
        &self,
        id: &ConnectionId,
        message_bytes: u64,
        enqueue: impl FnOnce() -> Result<(), E>,
    ) -> Option<Result<BufferAssessment, E>> {
        self.with_record(id, |record| {
            enqueue()?;
            Ok(record.apply_send(message_bytes))
        })
    }

    /// Subtract `drained_bytes` from `id`'s outstanding bytes, clamped at zero.
    pub fn record_drain(&self, id: &ConnectionId, drained_bytes: u64) -> Option<BufferAssessment> {
        self.with_record(id, |record| record.apply_drain(drained_bytes))
    }

    /// Whether `id` is above `MAX_BYTES`. False for unknown ids.
    pub fn should_disconnect(&self, id: &ConnectionId) -> bool {
        self.with_record(id, |record| record.should_disconnect())
            .unwrap_or(false)
    }

    /// Records whose outstanding bytes are strictly above `threshold_bytes`.
    pub fn connections_above(&self, threshold_bytes: u64) -> Vec<ConnectionRecord> {
        let shared: Vec<SharedRecord> = self
            .records
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        shared
            .iter()
            .map(|record| lock(record).clone())
            .filter(|record| record.outstanding_bytes() > threshold_bytes)
            .collect()
    }

    fn with_record<T>(
        &self,
        id: &ConnectionId,
        f: impl FnOnce(&mut ConnectionRecord) -> T,
    ) -> Option<T> {
        // Clone the Arc so the shard lock is released before the record lock.
        let shared = self.records.get(id).map(|entry| Arc::clone(entry.value()))?;
        let mut record = lock(&shared);
        Some(f(&mut record))
    }
}

fn lock(record: &Mutex<ConnectionRecord>) -> MutexGuard<'_, ConnectionRecord> {
    record.lock().unwrap_or_else(PoisonError::into_inner)
}
