//! Foundation module - Shared domain primitives.
//!
//! Contains the identifiers and time values that the backpressure and
//! messaging modules build on.

mod ids;
mod timestamp;

pub use ids::ConnectionId;
pub use timestamp::Timestamp;
