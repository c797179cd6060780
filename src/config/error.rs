//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Redis channel must not be empty")]
    EmptyRedisChannel,

    #[error("Redis backoff must satisfy 0 < initial <= max")]
    InvalidBackoff,

    #[error("Heartbeat interval must be between 1 and 3600 seconds")]
    InvalidHeartbeatInterval,

    #[error("API key list contains an empty entry")]
    EmptyApiKey,
}
