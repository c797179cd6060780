//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the gateway core to external systems:
//! - `auth` - API key authenticators for the WebSocket upgrade
//! - `events` - Connection event sinks and the disconnect dispatcher
//! - `redis` - Upstream transaction subscription
//! - `websocket` - Socket directory, upgrade handler and HTTP routes

pub mod auth;
pub mod events;
pub mod redis;
pub mod websocket;

pub use auth::{AllowAllAuthenticator, StaticApiKeyAuthenticator};
pub use events::{ChannelEventSink, DisconnectDispatcher, RecordingEventSink};
pub use redis::{RedisSubscriber, SubscriberError};
pub use websocket::{gateway_router, GatewayState, SocketDirectory};
