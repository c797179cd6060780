//! Domain layer containing the gateway's core types and bookkeeping.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (connection ids, timestamps)
//! - `backpressure` - Per-connection outstanding-byte accounting
//! - `messages` - Wire protocol and upstream record validation

pub mod backpressure;
pub mod foundation;
pub mod messages;
