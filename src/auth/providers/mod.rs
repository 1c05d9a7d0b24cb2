//! # Authentication Providers
//!
//! A provider implements one authentication scheme. Given the current request it answers
//! with a [`ProviderOutcome`]:
//!
//! - `Authenticated(id)`: credentials were valid, `id` is the principal
//! - `Rejected(rejection)`: credentials of this kind were present but invalid
//! - `NotApplicable`: no credentials of this kind were present, nothing was attempted
//!
//! Returning `Err` signals a provider-internal failure. The authenticator treats it like
//! `NotApplicable` but logs it.
//!
//! ## Rust Concepts Used
//!
//! - `#[async_trait]` allows `async fn` in a trait used as `Arc<dyn AuthProvider>`
//! - `Send + Sync` bounds let providers be shared across request tasks

use async_trait::async_trait;

use crate::core::error::AuthResult;
use crate::core::types::{AuthRequest, UserId};

pub mod basic;
pub mod jwt;
pub mod oauth2;

pub use basic::{BasicProvider, CredentialVerifier, InMemoryCredentials};
pub use jwt::{JwtClaims, JwtConfig, JwtProvider};
pub use oauth2::{AccessToken, InMemoryTokenStore, OAuth2Provider, TokenIntrospector};

/// Result of a single provider attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Authenticated(UserId),
    Rejected(Rejection),
    NotApplicable,
}

impl ProviderOutcome {
    pub fn authenticated<I: Into<UserId>>(id: I) -> Self {
        Self::Authenticated(id.into())
    }

    pub fn rejected<S: Into<String>>(message: S) -> Self {
        Self::Rejected(Rejection::new(message))
    }
}

/// Why a provider refused credentials it recognized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub message: String,
    /// Value for the `WWW-Authenticate` response header
    pub challenge: Option<String>,
}

impl Rejection {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            challenge: None,
        }
    }

    pub fn with_challenge<S: Into<String>>(mut self, challenge: S) -> Self {
        self.challenge = Some(challenge.into());
        self
    }
}

impl From<Rejection> for ProviderOutcome {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

/// Per-attempt data the authenticator hands to a provider alongside the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderContext {
    /// Scopes the current route requires. Only populated for the `oauth2` provider.
    pub scopes: Vec<String>,
}

impl ProviderContext {
    pub fn with_scopes(scopes: Vec<String>) -> Self {
        Self { scopes }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Attempt to authenticate the request
    async fn authenticate(
        &self,
        request: &AuthRequest<'_>,
        context: &ProviderContext,
    ) -> AuthResult<ProviderOutcome>;
}
