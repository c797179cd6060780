//! Transaction relay - upstream payload in, broadcast out.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::domain::messages::{parse_upstream, serialize, wrap_data, CodecError, WireMessage};

use super::fan_out::{BroadcastFanOut, BroadcastReport};

/// Counters for relayed and rejected upstream records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub relayed: u64,
    pub rejected: u64,
}

/// Validates upstream records and broadcasts them as data messages.
///
/// A record that fails validation is dropped and never reaches a client.
pub struct TransactionRelay {
    fan_out: Arc<BroadcastFanOut>,
    relayed: AtomicU64,
    rejected: AtomicU64,
}

impl TransactionRelay {
    pub fn new(fan_out: Arc<BroadcastFanOut>) -> Self {
        Self {
            fan_out,
            relayed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Relay one raw upstream payload.
    pub fn relay(&self, payload: &[u8]) -> Result<BroadcastReport, CodecError> {
        let record = match parse_upstream(payload) {
            Ok(record) => record,
            Err(e) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, bytes = payload.len(), "Rejected upstream record");
                return Err(e);
            }
        };

        let message = serialize(&WireMessage::from(wrap_data(&record)))?;
        let report = self.fan_out.broadcast(&message);
        self.relayed.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            hash = %record.hash,
            delivered = report.delivered,
            overflowed = report.overflowed,
            "Transaction relayed"
        );

        Ok(report)
    }

    pub fn stats(&self) -> RelayStats {
        RelayStats {
            relayed: self.relayed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}
