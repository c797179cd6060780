//! Client → server frames.
//!
//! Server → client frames are the domain [`WireMessage`] types. Clients may
//! only send a ping; any other text is answered with an error frame.
//!
//! [`WireMessage`]: crate::domain::messages::WireMessage

use serde::Deserialize;

use crate::domain::messages::{error_codes, make_error, make_heartbeat, WireMessage};

/// Messages a client may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Liveness check, answered with a heartbeat.
    Ping,
}

/// Reply for one client text frame.
pub fn reply_to(text: &str) -> WireMessage {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping) => make_heartbeat().into(),
        Err(_) => make_error(
            error_codes::UNSUPPORTED_MESSAGE,
            "Only {\"type\":\"ping\"} is accepted",
        )
        .into(),
    }
}
