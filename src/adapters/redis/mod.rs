//! Redis adapters.
//!
//! - `RedisSubscriber` - Upstream transaction subscription with reconnect backoff

mod subscriber;

pub use subscriber::{RedisSubscriber, SubscriberError};
