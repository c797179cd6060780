//! Outbound message shapes.

use serde::{Deserialize, Serialize};

use super::transaction::TransactionRecord;

/// Machine-readable codes carried by [`ErrorMessage`].
pub mod error_codes {
    /// The connection fell too far behind and is being dropped.
    pub const BUFFER_OVERFLOW: &str = "BUFFER_OVERFLOW";
    /// The gateway is shutting down.
    pub const SERVER_SHUTDOWN: &str = "SERVER_SHUTDOWN";
    /// The client sent a frame the gateway does not understand.
    pub const UNSUPPORTED_MESSAGE: &str = "UNSUPPORTED_MESSAGE";
}

/// All message types the gateway sends to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// Upstream transaction.
    #[serde(rename = "transaction")]
    Data(DataMessage),

    /// Liveness signal.
    Heartbeat(HeartbeatMessage),

    /// Error notification.
    Error(ErrorMessage),
}

/// Upstream record plus the gateway's delivery timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataMessage {
    pub data: TransactionRecord,
    pub server_timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatMessage {
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    pub timestamp: u64,
}

impl From<DataMessage> for WireMessage {
    fn from(message: DataMessage) -> Self {
        WireMessage::Data(message)
    }
}

impl From<HeartbeatMessage> for WireMessage {
    fn from(message: HeartbeatMessage) -> Self {
        WireMessage::Heartbeat(message)
    }
}

impl From<ErrorMessage> for WireMessage {
    fn from(message: ErrorMessage) -> Self {
        WireMessage::Error(message)
    }
}
