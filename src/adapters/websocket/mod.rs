//! WebSocket adapters - the client-facing edge of the gateway.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        BroadcastFanOut                               │
//! │   is_writable / send per registered connection                       │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ Transport
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       SocketDirectory                                │
//! │   conn-a: outbound queue + close signal                              │
//! │   conn-b: outbound queue + close signal                              │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │
//!                                     │ per-socket writer task
//!                                     ▼
//!                              WebSocket clients
//! ```
//!
//! # Components
//!
//! - [`messages`] - Client → server frames
//! - [`directory`] - Transport implementation over live sockets
//! - [`handler`] - Axum upgrade handler, health route and router

pub mod directory;
pub mod handler;
pub mod messages;

pub use directory::{CloseSignal, OutboundReceiver, SocketDirectory};
pub use handler::{gateway_router, health_handler, ws_handler, ConnectParams, GatewayState, API_KEY_HEADER};
pub use messages::{reply_to, ClientMessage};
