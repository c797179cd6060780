//! TxnScope Gateway - WebSocket fan-out for mempool transactions
//!
//! This crate relays upstream mempool transactions to WebSocket clients and
//! tracks per-connection outstanding bytes, disconnecting clients that fall
//! too far behind instead of letting their backlog grow without bound.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
