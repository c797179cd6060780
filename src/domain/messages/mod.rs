//! Wire protocol between the gateway and its clients.
//!
//! Server → client frames are JSON objects whose first key is always `type`:
//!
//! ```text
//! { "type": "transaction", "data": { ...record... }, "serverTimestamp": 1703000000123 }
//! { "type": "heartbeat",   "timestamp": 1703000000123 }
//! { "type": "error",       "code": "BUFFER_OVERFLOW", "message": "...", "timestamp": 1703000000123 }
//! ```
//!
//! # Components
//!
//! - [`transaction`] - Upstream mempool transaction record
//! - [`wire`] - The three outbound message shapes
//! - [`codec`] - Constructors, serialization and upstream validation

pub mod codec;
pub mod transaction;
pub mod wire;

pub use codec::{
    deserialize, make_error, make_heartbeat, parse_upstream, serialize, wrap_data, CodecError,
    SerializedMessage,
};
pub use transaction::{TransactionRecord, REQUIRED_FIELDS};
pub use wire::{error_codes, DataMessage, ErrorMessage, HeartbeatMessage, WireMessage};
