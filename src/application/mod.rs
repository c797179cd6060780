//! Application layer - orchestrates the domain through the ports.
//!
//! # Components
//!
//! - [`registry`] - Connection registry and backpressure notifications
//! - [`fan_out`] - Broadcast of one serialized message to every connection
//! - [`relay`] - Upstream record validation and relay
//! - [`heartbeat`] - Periodic heartbeat broadcast

pub mod fan_out;
pub mod heartbeat;
pub mod registry;
pub mod relay;

pub use fan_out::{BroadcastFanOut, BroadcastReport, Delivery};
pub use heartbeat::HeartbeatService;
pub use registry::ConnectionRegistry;
pub use relay::{RelayStats, TransactionRelay};
