//! Per-connection backpressure bookkeeping.
//!
//! Tracks how many serialized bytes have been handed to each connection's
//! transport but not yet confirmed written, and classifies every connection
//! against two process-wide ceilings.
//!
//! # Bands
//!
//! ```text
//!  0 ─────────────── WARNING_BYTES ──────────── MAX_BYTES ─────────────▶
//!  │     Healthy     │        Warning           │      Overflow
//!  │                 │ (exclusive)   (inclusive)│  (forced disconnect)
//! ```
//!
//! # Components
//!
//! - [`thresholds`] - The two ceilings and the [`BufferHealth`] classifier
//! - [`record`] - One connection's counters and the mutations applied to them
//! - [`accountant`] - Concurrent map of records with per-entry locking
//! - [`events`] - Warning and disconnect notifications

pub mod accountant;
pub mod events;
pub mod record;
pub mod thresholds;

pub use accountant::BufferAccountant;
pub use events::{ConnectionEvent, DisconnectReason};
pub use record::{BufferAssessment, ConnectionRecord};
pub use thresholds::{BufferHealth, MAX_BYTES, WARNING_BYTES};
