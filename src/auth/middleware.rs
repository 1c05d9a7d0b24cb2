//! # Authentication Middleware
//!
//! Tower layer that runs the [`Authenticator`] before the wrapped service. For every
//! request it builds a fresh authenticator from the shared provider registry, attempts
//! authentication, and either answers with a 401 response or forwards the request with
//! the authenticator stored in the request extensions.
//!
//! The route descriptor must already be in the request extensions when this layer runs,
//! so attach it outside of the auth layer:
//!
//! ```rust,ignore
//! let route = get(handler)
//!     .layer(AuthLayer::new(registry, users))
//!     .layer(Extension(RouteDescriptor::new().protected()));
//! ```
//!
//! ## Rust Concepts Used
//!
//! - `tower::Layer` / `tower::Service` for middleware implementation
//! - `Pin<Box<dyn Future>>` for the boxed response future
//! - `std::mem::replace` to take the ready inner service and leave a clone behind

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::auth::authenticator::{AuthOutcome, Authenticator};
use crate::auth::identity::{RequestGuard, UserProvider};
use crate::auth::registry::ProviderRegistry;
use crate::core::types::{AuthRequest, SessionUser};

/// Tower layer for authentication
#[derive(Clone)]
pub struct AuthLayer {
    providers: ProviderRegistry,
    users: Arc<dyn UserProvider>,
}

impl AuthLayer {
    pub fn new(providers: ProviderRegistry, users: Arc<dyn UserProvider>) -> Self {
        Self { providers, users }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            providers: self.providers.clone(),
            users: self.users.clone(),
        }
    }
}

/// Tower service for authentication
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    providers: ProviderRegistry,
    users: Arc<dyn UserProvider>,
}

impl<S> Service<Request> for AuthService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let providers = self.providers.clone();
        let users = self.users.clone();

        Box::pin(async move {
            let (mut parts, body) = request.into_parts();

            let mut guard = RequestGuard::new(users);
            if let Some(SessionUser(id)) = parts.extensions.get::<SessionUser>() {
                guard = guard.with_session_user(id.clone());
            }

            let mut authenticator = Authenticator::new(providers, guard);
            let result = authenticator
                .authenticate(&AuthRequest::from_parts(&parts))
                .await;

            match result {
                Ok(outcome) => {
                    if let AuthOutcome::Authenticated { provider, user_id } = &outcome {
                        tracing::info!(
                            method = %parts.method,
                            path = %parts.uri.path(),
                            provider = %provider,
                            user_id = %user_id,
                            "Request authenticated"
                        );
                    }
                    parts.extensions.insert(outcome);
                    parts.extensions.insert(authenticator);
                    inner.call(Request::from_parts(parts, body)).await
                }
                Err(err) => {
                    tracing::warn!(
                        method = %parts.method,
                        path = %parts.uri.path(),
                        error = %err,
                        "Authentication failed"
                    );
                    Ok(err.into_response())
                }
            }
        })
    }
}

/// Utility functions for reading authentication results from requests
pub mod utils {
    use axum::extract::Request;

    use crate::auth::authenticator::{AuthOutcome, Authenticator};
    use crate::core::types::UserId;

    /// The per-request authenticator stored by [`AuthService`](super::AuthService)
    pub fn get_authenticator(request: &Request) -> Option<Authenticator> {
        request.extensions().get::<Authenticator>().cloned()
    }

    /// Check if a provider authenticated the request
    pub fn is_authenticated(request: &Request) -> bool {
        matches!(
            request.extensions().get::<AuthOutcome>(),
            Some(AuthOutcome::Authenticated { .. })
        )
    }

    /// Get user ID from authenticated request
    pub fn get_user_id(request: &Request) -> Option<UserId> {
        request
            .extensions()
            .get::<AuthOutcome>()
            .and_then(|outcome| outcome.user_id().cloned())
    }
}
