//! HTTP Basic authentication provider.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dashmap::DashMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::{AuthProvider, ProviderContext, ProviderOutcome, Rejection};
use crate::core::error::AuthResult;
use crate::core::types::{AuthRequest, UserId};

const INVALID_CREDENTIALS: &str = "Invalid authentication credentials.";

/// Checks a username/password pair against a credential store
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Returns the user id for valid credentials, `None` otherwise
    async fn verify(&self, username: &str, password: &str) -> AuthResult<Option<UserId>>;
}

/// In-memory credential store keyed by username
///
/// Passwords are held in plain text, so this is for tests and the demo server;
/// production deployments implement [`CredentialVerifier`] over password hashes.
#[derive(Debug, Default)]
pub struct InMemoryCredentials {
    entries: DashMap<String, (String, UserId)>,
}

impl InMemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<U, P, I>(&self, username: U, password: P, user_id: I)
    where
        U: Into<String>,
        P: Into<String>,
        I: Into<UserId>,
    {
        self.entries
            .insert(username.into(), (password.into(), user_id.into()));
    }
}

#[async_trait]
impl CredentialVerifier for InMemoryCredentials {
    async fn verify(&self, username: &str, password: &str) -> AuthResult<Option<UserId>> {
        Ok(self
            .entries
            .get(username)
            .filter(|entry| password_matches(&entry.0, password))
            .map(|entry| entry.1.clone()))
    }
}

/// Constant-time password comparison
fn password_matches(stored: &str, given: &str) -> bool {
    stored.as_bytes().ct_eq(given.as_bytes()).into()
}

/// Authenticates `Authorization: Basic` credentials
pub struct BasicProvider {
    verifier: Arc<dyn CredentialVerifier>,
    realm: String,
}

impl BasicProvider {
    pub fn new(verifier: Arc<dyn CredentialVerifier>, realm: impl Into<String>) -> Self {
        Self {
            verifier,
            realm: realm.into(),
        }
    }

    fn reject(&self) -> ProviderOutcome {
        Rejection::new(INVALID_CREDENTIALS)
            .with_challenge(format!("Basic realm=\"{}\"", self.realm))
            .into()
    }
}

/// Split a base64 `user:password` payload. The password may itself contain colons.
fn decode_credentials(encoded: &str) -> Option<(String, String)> {
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

#[async_trait]
impl AuthProvider for BasicProvider {
    async fn authenticate(
        &self,
        request: &AuthRequest<'_>,
        _context: &ProviderContext,
    ) -> AuthResult<ProviderOutcome> {
        let Some(encoded) = request.authorization("Basic") else {
            return Ok(ProviderOutcome::NotApplicable);
        };

        let Some((username, password)) = decode_credentials(encoded) else {
            return Ok(self.reject());
        };

        match self.verifier.verify(&username, &password).await? {
            Some(user_id) => Ok(ProviderOutcome::Authenticated(user_id)),
            None => {
                tracing::debug!(username = %username, "Basic credentials rejected");
                Ok(self.reject())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    fn provider() -> BasicProvider {
        let store = Arc::new(InMemoryCredentials::new());
        store.insert("alice", "s3cr:et", "user-1");
        BasicProvider::new(store, "api")
    }

    fn request_with(header: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn attempt(header: Option<&str>) -> ProviderOutcome {
        let request = request_with(header);
        provider()
            .authenticate(&AuthRequest::from_http(&request), &ProviderContext::default())
            .await
            .unwrap()
    }

    #[test]
    fn test_password_comparison() {
        assert!(password_matches("engine", "engine"));
        assert!(!password_matches("engine", "engines"));
        assert!(!password_matches("engine", "Engine"));
        assert!(!password_matches("engine", ""));
    }

    #[tokio::test]
    async fn test_valid_credentials() {
        let header = format!("Basic {}", STANDARD.encode("alice:s3cr:et"));
        assert_eq!(
            attempt(Some(&header)).await,
            ProviderOutcome::authenticated("user-1")
        );
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected_with_challenge() {
        let header = format!("Basic {}", STANDARD.encode("alice:nope"));
        match attempt(Some(&header)).await {
            ProviderOutcome::Rejected(rejection) => {
                assert_eq!(rejection.message, INVALID_CREDENTIALS);
                assert_eq!(rejection.challenge.as_deref(), Some("Basic realm=\"api\""));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_payload_is_rejected() {
        assert!(matches!(
            attempt(Some("Basic !!!not-base64")).await,
            ProviderOutcome::Rejected(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_or_foreign_header_is_not_applicable() {
        assert_eq!(attempt(None).await, ProviderOutcome::NotApplicable);
        assert_eq!(
            attempt(Some("Bearer abc")).await,
            ProviderOutcome::NotApplicable
        );
    }
}
