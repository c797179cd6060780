//! Outstanding-byte ceilings.

use serde::Serialize;

/// Outstanding bytes above which a connection is reported as a slow consumer.
pub const WARNING_BYTES: u64 = 4 * 1024 * 1024;

/// Outstanding bytes above which a connection is forcibly disconnected.
pub const MAX_BYTES: u64 = 5 * 1024 * 1024;

const _: () = assert!(MAX_BYTES > WARNING_BYTES);

/// Health band a connection's outstanding bytes fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferHealth {
    /// At or below `WARNING_BYTES`.
    Healthy,
    /// Above `WARNING_BYTES`, at or below `MAX_BYTES`.
    Warning,
    /// Above `MAX_BYTES`.
    Overflow,
}

impl BufferHealth {
    /// Classify an outstanding-byte count.
    pub fn classify(outstanding_bytes: u64) -> Self {
        if outstanding_bytes > MAX_BYTES {
            BufferHealth::Overflow
        } else if outstanding_bytes > WARNING_BYTES {
            BufferHealth::Warning
        } else {
            BufferHealth::Healthy
        }
    }
}
