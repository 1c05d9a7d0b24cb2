//! # OAuth2 Bearer Provider
//!
//! Validates OAuth2 access tokens through a [`TokenIntrospector`] and checks them against
//! the scopes the current route declares. Scopes arrive per attempt through
//! [`ProviderContext`], so the provider itself holds no request state and can be shared
//! freely between concurrent requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{AuthProvider, ProviderContext, ProviderOutcome, Rejection};
use crate::core::error::AuthResult;
use crate::core::types::{AuthRequest, UserId};

const INVALID_TOKEN: &str = "The access token is invalid.";
const EXPIRED_TOKEN: &str = "The access token has expired.";
const INVALID_SCOPE: &str = "Requested scope is invalid.";
const NO_OWNER: &str = "The access token is not associated with a user.";

/// An access token as known to the authorization server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,

    /// Owning user; client-credential tokens have none
    #[serde(default)]
    pub user_id: Option<UserId>,

    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn for_user<T: Into<String>, I: Into<UserId>>(token: T, user_id: I) -> Self {
        Self {
            token: token.into(),
            user_id: Some(user_id.into()),
            scopes: Vec::new(),
            expires_at: None,
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() > at)
    }
}

/// Looks up access tokens, e.g. via an introspection endpoint or a token table
#[async_trait]
pub trait TokenIntrospector: Send + Sync {
    async fn introspect(&self, token: &str) -> AuthResult<Option<AccessToken>>;
}

/// In-memory token table
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: DashMap<String, AccessToken>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: AccessToken) {
        self.tokens.insert(token.token.clone(), token);
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.remove(token).is_some()
    }
}

#[async_trait]
impl TokenIntrospector for InMemoryTokenStore {
    async fn introspect(&self, token: &str) -> AuthResult<Option<AccessToken>> {
        Ok(self.tokens.get(token).map(|entry| entry.value().clone()))
    }
}

pub struct OAuth2Provider {
    introspector: Arc<dyn TokenIntrospector>,
}

impl OAuth2Provider {
    pub fn new(introspector: Arc<dyn TokenIntrospector>) -> Self {
        Self { introspector }
    }

    fn reject(message: &str) -> ProviderOutcome {
        Rejection::new(message).with_challenge("Bearer").into()
    }
}

#[async_trait]
impl AuthProvider for OAuth2Provider {
    async fn authenticate(
        &self,
        request: &AuthRequest<'_>,
        context: &ProviderContext,
    ) -> AuthResult<ProviderOutcome> {
        let Some(token) = request.bearer_token() else {
            return Ok(ProviderOutcome::NotApplicable);
        };

        let Some(access_token) = self.introspector.introspect(token).await? else {
            return Ok(Self::reject(INVALID_TOKEN));
        };

        if access_token.is_expired() {
            return Ok(Self::reject(EXPIRED_TOKEN));
        }

        // Any one of the route's scopes grants access
        if !context.scopes.is_empty()
            && !context.scopes.iter().any(|scope| access_token.has_scope(scope))
        {
            tracing::debug!(
                required = ?context.scopes,
                granted = ?access_token.scopes,
                "Access token lacks required scope"
            );
            return Ok(Self::reject(INVALID_SCOPE));
        }

        match access_token.user_id {
            Some(user_id) => Ok(ProviderOutcome::Authenticated(user_id)),
            None => Ok(Self::reject(NO_OWNER)),
        }
    }
}
