//! # Authenticator
//!
//! Coordinates authentication for a single request. An `Authenticator` is cheap to build:
//! it shares the process-wide [`ProviderRegistry`] and owns only per-request state (the
//! authenticated id, the cached user and the identity guard). The middleware creates one
//! per request, so results never leak from one request into the next.
//!
//! ## Dispatch
//!
//! Providers are tried in registry order. The first `Authenticated` outcome wins.
//! `Rejected` outcomes are collected; `NotApplicable` outcomes and provider errors are
//! skipped. When nothing succeeds the first rejection is returned, or the generic
//! failure when no provider recognized any credentials.

use std::fmt;

use crate::auth::identity::RequestGuard;
use crate::auth::providers::{ProviderContext, ProviderOutcome, Rejection};
use crate::auth::registry::{ProviderRegistry, OAUTH2_PROVIDER};
use crate::core::error::{AuthError, AuthResult};
use crate::core::types::{AuthRequest, User, UserId};

/// Why `authenticate` returned without consulting any provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Framework-internal dispatch
    Internal,
    /// A user was already resolved or injected for this request
    UserCached,
    /// No route, or the route does not require authentication
    Unprotected,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Internal => "internal request",
            Self::UserCached => "user already resolved",
            Self::Unprotected => "route not protected",
        };
        f.write_str(reason)
    }
}

/// Successful result of [`Authenticator::authenticate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Skipped(SkipReason),
    Authenticated { provider: String, user_id: UserId },
}

impl AuthOutcome {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Authenticated { user_id, .. } => Some(user_id),
            Self::Skipped(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Authenticator {
    providers: ProviderRegistry,
    guard: RequestGuard,
    authenticated_user_id: Option<UserId>,
    cached_user: Option<User>,
}

impl Authenticator {
    pub fn new(providers: ProviderRegistry, guard: RequestGuard) -> Self {
        Self {
            providers,
            guard,
            authenticated_user_id: None,
            cached_user: None,
        }
    }

    /// Authenticate the current request against the registered providers.
    ///
    /// Internal requests, requests with an already cached user, and requests for
    /// unprotected routes return [`AuthOutcome::Skipped`] without side effects.
    pub async fn authenticate(&mut self, request: &AuthRequest<'_>) -> AuthResult<AuthOutcome> {
        if request.internal {
            return Ok(AuthOutcome::Skipped(SkipReason::Internal));
        }

        if self.cached_user.is_some() {
            return Ok(AuthOutcome::Skipped(SkipReason::UserCached));
        }

        let Some(route) = request.route.filter(|route| route.is_protected()) else {
            return Ok(AuthOutcome::Skipped(SkipReason::Unprotected));
        };

        let oauth2_context = if self.providers.contains(OAUTH2_PROVIDER) {
            ProviderContext::with_scopes(route.scopes())
        } else {
            ProviderContext::default()
        };
        let default_context = ProviderContext::default();

        let providers = self.providers.clone();
        let mut rejections: Vec<(&str, Rejection)> = Vec::new();

        for (key, provider) in providers.iter() {
            let context = if key == OAUTH2_PROVIDER {
                &oauth2_context
            } else {
                &default_context
            };

            match provider.authenticate(request, context).await {
                Ok(ProviderOutcome::Authenticated(user_id)) => {
                    tracing::debug!(provider = %key, user_id = %user_id, "Request authenticated");
                    self.authenticated_user_id = Some(user_id.clone());
                    return Ok(AuthOutcome::Authenticated {
                        provider: key.to_string(),
                        user_id,
                    });
                }
                Ok(ProviderOutcome::Rejected(rejection)) => {
                    tracing::debug!(provider = %key, reason = %rejection.message, "Provider rejected credentials");
                    rejections.push((key, rejection));
                }
                Ok(ProviderOutcome::NotApplicable) => {
                    tracing::trace!(provider = %key, "Provider found no credentials");
                }
                Err(err) => {
                    tracing::warn!(provider = %key, error = %err, "Provider failed, skipping it");
                }
            }
        }

        Err(match rejections.into_iter().next() {
            Some((provider, rejection)) => {
                AuthError::unauthorized(provider, rejection.challenge, rejection.message)
            }
            None => AuthError::unauthenticated(),
        })
    }

    /// The authenticated user, resolved once and then cached.
    ///
    /// Without an active session user, the authenticated id is logged in for this
    /// request only. Returns `None` when nobody was authenticated.
    pub async fn user(&mut self) -> AuthResult<Option<User>> {
        if let Some(user) = &self.cached_user {
            return Ok(Some(user.clone()));
        }

        if !self.guard.check().await? {
            if let Some(id) = &self.authenticated_user_id {
                self.guard.once_using_id(id).await?;
            }
        }

        self.cached_user = self.guard.user().await?;
        Ok(self.cached_user.clone())
    }

    /// Alias of [`user`](Self::user)
    pub async fn get_user(&mut self) -> AuthResult<Option<User>> {
        self.user().await
    }

    /// Replace the cached user
    pub fn set_user(&mut self, user: User) -> &mut Self {
        self.cached_user = Some(user);
        self
    }

    /// Id set by the provider that authenticated this request
    pub fn user_id(&self) -> Option<&UserId> {
        self.authenticated_user_id.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated_user_id.is_some() || self.cached_user.is_some()
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }
}
