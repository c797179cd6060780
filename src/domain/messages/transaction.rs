//! Upstream mempool transaction record.

use serde::{Deserialize, Serialize};

/// Keys every upstream record must carry, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "hash",
    "from",
    "to",
    "method",
    "methodId",
    "value",
    "gasPrice",
    "timestamp",
];

/// A filtered DEX transaction as published by the ingestor.
///
/// Values are carried verbatim; the gateway never reinterprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Transaction hash with 0x prefix
    pub hash: String,
    /// Sender address
    pub from: String,
    /// Recipient address, empty string for contract creation
    pub to: String,
    /// Human-readable method name (e.g., "swapExactTokensForTokens")
    pub method: String,
    /// Method selector with 0x prefix (e.g., "0x38ed1739")
    pub method_id: String,
    /// Value in wei as a decimal string
    pub value: String,
    /// Gas price in wei as a decimal string
    pub gas_price: String,
    /// Unix milliseconds when the ingestor saw the transaction
    pub timestamp: u64,
}
