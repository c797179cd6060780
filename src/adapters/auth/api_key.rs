//! API key authenticators for the WebSocket upgrade.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

use crate::ports::{AuthError, ConnectionAuthenticator};

/// Accepts every upgrade request. Used when no API keys are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllAuthenticator;

#[async_trait]
impl ConnectionAuthenticator for AllowAllAuthenticator {
    async fn authenticate(&self, _credential: Option<&str>) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Accepts requests presenting one of a fixed set of API keys.
///
/// Keys are compared in constant time and every configured key is checked,
/// so timing does not reveal which key (if any) matched.
pub struct StaticApiKeyAuthenticator {
    keys: Vec<SecretString>,
}

impl StaticApiKeyAuthenticator {
    pub fn new(keys: Vec<SecretString>) -> Self {
        Self { keys }
    }

    fn matches(&self, candidate: &str) -> bool {
        self.keys.iter().fold(false, |found, key| {
            constant_time_eq(key.expose_secret().as_bytes(), candidate.as_bytes()) | found
        })
    }
}

#[async_trait]
impl ConnectionAuthenticator for StaticApiKeyAuthenticator {
    async fn authenticate(&self, credential: Option<&str>) -> Result<(), AuthError> {
        let candidate = credential
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCredentials)?;

        if self.matches(candidate) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> StaticApiKeyAuthenticator {
        StaticApiKeyAuthenticator::new(vec![
            SecretString::new("alpha".to_string()),
            SecretString::new("beta".to_string()),
        ])
    }

    #[tokio::test]
    async fn allow_all_accepts_missing_credential() {
        assert!(AllowAllAuthenticator.authenticate(None).await.is_ok());
    }

    #[tokio::test]
    async fn accepts_any_configured_key() {
        let auth = authenticator();
        assert!(auth.authenticate(Some("alpha")).await.is_ok());
        assert!(auth.authenticate(Some("beta")).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_unknown_key() {
        assert_eq!(
            authenticator().authenticate(Some("gamma")).await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn rejects_prefix_of_valid_key() {
        assert_eq!(
            authenticator().authenticate(Some("alph")).await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn missing_or_empty_key_is_missing_credentials() {
        let auth = authenticator();
        assert_eq!(auth.authenticate(None).await, Err(AuthError::MissingCredentials));
        assert_eq!(auth.authenticate(Some("")).await, Err(AuthError::MissingCredentials));
    }
}
