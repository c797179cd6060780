//! Message construction, serialization and upstream validation.
//!
//! Outbound messages are serialized once and shared by every connection, so
//! [`SerializedMessage`] caches the UTF-8 byte length used for backpressure
//! accounting.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::foundation::Timestamp;

use super::transaction::{TransactionRecord, REQUIRED_FIELDS};
use super::wire::{DataMessage, ErrorMessage, HeartbeatMessage, WireMessage};

/// Errors produced while decoding or encoding messages.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field '{field}' must be a {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A message already encoded for the wire.
///
/// Cloning shares the underlying buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct SerializedMessage {
    text: Arc<str>,
}

impl SerializedMessage {
    /// Encoded text frame.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the encoded frame in bytes (not characters).
    pub fn byte_len(&self) -> u64 {
        self.text.len() as u64
    }

    /// Shared handle to the encoded frame.
    pub fn shared_text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }
}

impl fmt::Debug for SerializedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializedMessage")
            .field("byte_len", &self.byte_len())
            .finish()
    }
}

/// Wrap an upstream record for delivery, stamping the current time.
pub fn wrap_data(record: &TransactionRecord) -> DataMessage {
    DataMessage {
        data: record.clone(),
        server_timestamp: Timestamp::now().as_unix_millis(),
    }
}

/// Build a heartbeat stamped with the current time.
pub fn make_heartbeat() -> HeartbeatMessage {
    HeartbeatMessage {
        timestamp: Timestamp::now().as_unix_millis(),
    }
}

/// Build an error message stamped with the current time.
pub fn make_error(code: impl Into<String>, message: impl Into<String>) -> ErrorMessage {
    ErrorMessage {
        code: code.into(),
        message: message.into(),
        timestamp: Timestamp::now().as_unix_millis(),
    }
}

/// Encode a message as a JSON text frame.
pub fn serialize(message: &WireMessage) -> Result<SerializedMessage, CodecError> {
    let text = serde_json::to_string(message)?;
    Ok(SerializedMessage { text: text.into() })
}

/// Decode a JSON text frame produced by [`serialize`].
pub fn deserialize(bytes: &[u8]) -> Result<WireMessage, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::MalformedPayload(e.to_string()))
}

/// Validate and decode an upstream record.
///
/// Fails closed: the first missing key in [`REQUIRED_FIELDS`] order is
/// reported and nothing is returned.
pub fn parse_upstream(bytes: &[u8]) -> Result<TransactionRecord, CodecError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| CodecError::MalformedPayload(e.to_string()))?;

    let Value::Object(fields) = value else {
        return Err(CodecError::MalformedPayload(
            "expected a JSON object".to_string(),
        ));
    };

    if let Some(missing) = REQUIRED_FIELDS
        .iter()
        .find(|field| !fields.contains_key(**field))
    {
        return Err(CodecError::MissingField(missing));
    }

    Ok(TransactionRecord {
        hash: string_field(&fields, "hash")?,
        from: string_field(&fields, "from")?,
        to: string_field(&fields, "to")?,
        method: string_field(&fields, "method")?,
        method_id: string_field(&fields, "methodId")?,
        value: string_field(&fields, "value")?,
        gas_price: string_field(&fields, "gasPrice")?,
        timestamp: fields
            .get("timestamp")
            .and_then(Value::as_u64)
            .ok_or(CodecError::InvalidField {
                field: "timestamp",
                expected: "non-negative integer",
            })?,
    })
}

fn string_field(fields: &Map<String, Value>, field: &'static str) -> Result<String, CodecError> {
    fields
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(CodecError::InvalidField {
            field,
            expected: "string",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::messages::error_codes;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "hash": "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef",
            "from": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "to": "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D",
            "method": "swapExactTokensForTokens",
            "methodId": "0x38ed1739",
            "value": "1000000000000000000",
            "gasPrice": "20000000000",
            "timestamp": 1703000000000_u64
        })
    }

    fn bytes_of(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[test]
    fn parse_upstream_preserves_every_field() {
        let record = parse_upstream(&bytes_of(&valid_payload())).unwrap();

        assert_eq!(
            record.hash,
            "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef"
        );
        assert_eq!(record.from, "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert_eq!(record.to, "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D");
        assert_eq!(record.method, "swapExactTokensForTokens");
        assert_eq!(record.method_id, "0x38ed1739");
        assert_eq!(record.value, "1000000000000000000");
        assert_eq!(record.gas_price, "20000000000");
        assert_eq!(record.timestamp, 1_703_000_000_000);
    }

    #[test]
    fn parse_upstream_reports_missing_method() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("method");

        let err = parse_upstream(&bytes_of(&payload)).unwrap_err();
        assert!(matches!(err, CodecError::MissingField("method")));
    }

    #[test]
    fn parse_upstream_reports_first_missing_field_in_order() {
        let mut payload = valid_payload();
        let fields = payload.as_object_mut().unwrap();
        fields.remove("gasPrice");
        fields.remove("to");

        let err = parse_upstream(&bytes_of(&payload)).unwrap_err();
        assert!(matches!(err, CodecError::MissingField("to")));
    }

    #[test]
    fn parse_upstream_rejects_non_json() {
        let err = parse_upstream(b"{not json").unwrap_err();
        assert!(matches!(err, CodecError::MalformedPayload(_)));
    }

    #[test]
    fn parse_upstream_rejects_non_object() {
        let err = parse_upstream(b"[1,2,3]").unwrap_err();
        assert!(matches!(err, CodecError::MalformedPayload(_)));
    }

    #[test]
    fn parse_upstream_rejects_wrong_types() {
        let mut payload = valid_payload();
        payload["timestamp"] = json!("yesterday");
        let err = parse_upstream(&bytes_of(&payload)).unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidField {
                field: "timestamp",
                ..
            }
        ));

        let mut payload = valid_payload();
        payload["value"] = json!(1000);
        let err = parse_upstream(&bytes_of(&payload)).unwrap_err();
        assert!(matches!(err, CodecError::InvalidField { field: "value", .. }));
    }

    #[test]
    fn parse_upstream_ignores_extra_fields() {
        let mut payload = valid_payload();
        payload["nonce"] = json!(7);
        assert!(parse_upstream(&bytes_of(&payload)).is_ok());
    }

    #[test]
    fn missing_field_error_names_the_field() {
        let err = CodecError::MissingField("methodId");
        assert_eq!(err.to_string(), "Missing required field: methodId");
    }

    #[test]
    fn wrap_data_leaves_record_untouched() {
        let record = parse_upstream(&bytes_of(&valid_payload())).unwrap();
        let before = record.clone();

        let message = wrap_data(&record);

        assert_eq!(record, before);
        assert_eq!(message.data, record);
        assert!(message.server_timestamp > 0);
    }

    #[test]
    fn serialize_then_deserialize_restores_message() {
        let record = parse_upstream(&bytes_of(&valid_payload())).unwrap();
        let message: WireMessage = wrap_data(&record).into();

        let encoded = serialize(&message).unwrap();
        let decoded = deserialize(encoded.as_str().as_bytes()).unwrap();

        assert_eq!(decoded, message);
    }

    #[test]
    fn serialize_is_deterministic() {
        let message: WireMessage = make_error(error_codes::SERVER_SHUTDOWN, "bye").into();
        assert_eq!(serialize(&message).unwrap(), serialize(&message).unwrap());
    }

    #[test]
    fn byte_len_counts_utf8_bytes_not_chars() {
        let message: WireMessage = ErrorMessage {
            code: "X".to_string(),
            message: "héllo ✓".to_string(),
            timestamp: 1,
        }
        .into();

        let encoded = serialize(&message).unwrap();
        assert_eq!(encoded.byte_len(), encoded.as_str().len() as u64);
        assert!(encoded.byte_len() > encoded.as_str().chars().count() as u64);
    }

    #[test]
    fn heartbeat_and_error_are_time_stamped() {
        let heartbeat = make_heartbeat();
        let error = make_error("CODE", "text");

        assert!(heartbeat.timestamp > 0);
        assert_eq!(error.code, "CODE");
        assert_eq!(error.message, "text");
        assert!(error.timestamp > 0);
    }
}
