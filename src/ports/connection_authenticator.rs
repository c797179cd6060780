//! ConnectionAuthenticator port - Gate in front of the WebSocket upgrade.
//!
//! The gateway core trusts every id it is given; this port is where a
//! deployment decides which upgrade requests ever reach it.

use async_trait::async_trait;
use thiserror::Error;

/// Reasons an upgrade request is refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No credential was supplied
    #[error("Missing credentials")]
    MissingCredentials,

    /// The credential is not recognised
    #[error("Invalid credentials")]
    InvalidCredentials,
}

/// Validates the credential presented with an upgrade request.
///
/// # Contract
///
/// Implementations must:
/// - Return `Ok(())` only for credentials allowed to subscribe
/// - Return `AuthError::MissingCredentials` when required and absent
/// - Not log the credential itself
#[async_trait]
pub trait ConnectionAuthenticator: Send + Sync {
    /// Check the presented credential (query parameter or header value).
    async fn authenticate(&self, credential: Option<&str>) -> Result<(), AuthError>;
}
