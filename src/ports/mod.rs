//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the gateway core and the outside world. Adapters implement these ports.
//!
//! - `ConnectionEventSink` - Receiver of warning/disconnect notifications
//! - `Transport` - Per-connection outbound socket queues
//! - `ConnectionAuthenticator` - Credential check before upgrade

mod connection_authenticator;
mod connection_events;
mod transport;

pub use connection_authenticator::{AuthError, ConnectionAuthenticator};
pub use connection_events::ConnectionEventSink;
pub use transport::{Transport, TransportError};
