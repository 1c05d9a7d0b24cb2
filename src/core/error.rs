//! # Error Handling Module
//!
//! This module defines the error type used by the authentication layer, built with the
//! `thiserror` crate. Every error maps onto an HTTP status code so the hosting pipeline
//! can turn a failed authentication attempt straight into a response.
//!
//! ## Error Taxonomy
//!
//! Only two variants ever escape [`Authenticator::authenticate`](crate::auth::Authenticator::authenticate):
//!
//! - [`AuthError::Unauthorized`]: a provider recognized credentials and rejected them.
//! - [`AuthError::Unauthenticated`]: nothing succeeded and nobody rejected, i.e. no
//!   credentials of any recognized kind were present.
//!
//! Provider-internal failures ([`AuthError::Provider`]) are downgraded to "not attempted"
//! by the authenticator and only show up in the logs.
//!
//! ## Rust Concepts Used
//!
//! - `#[error("...")]` derives `Display` for each variant
//! - `IntoResponse` lets axum handlers return `AuthError` directly

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Message used when no provider succeeded and none rejected the request.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Failed to authenticate because of bad credentials or an invalid authorization header.";

/// Result type used throughout the crate
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors produced by the authentication layer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A provider found credentials of its kind and rejected them
    #[error("{message}")]
    Unauthorized {
        provider: String,
        challenge: Option<String>,
        message: String,
    },

    /// No provider succeeded and none recognized any credentials
    #[error("{message}")]
    Unauthenticated { message: String },

    /// A provider failed internally (store unavailable, misconfiguration, ...)
    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    /// Configuration-related errors (invalid config, missing files, etc.)
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl AuthError {
    /// Create an unauthorized error on behalf of a provider
    pub fn unauthorized<P, M>(provider: P, challenge: Option<String>, message: M) -> Self
    where
        P: Into<String>,
        M: Into<String>,
    {
        Self::Unauthorized {
            provider: provider.into(),
            challenge,
            message: message.into(),
        }
    }

    /// The synthesized failure used when every provider was skipped
    pub fn unauthenticated() -> Self {
        Self::Unauthenticated {
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Create a provider-internal error
    pub fn provider<P: Into<String>, M: Into<String>>(provider: P, message: M) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error means "the caller is not authenticated"
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::Unauthenticated { .. })
    }

    /// The `WWW-Authenticate` challenge to send back, if any
    pub fn challenge(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { challenge, .. } => challenge.as_deref(),
            _ => None,
        }
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::Provider { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a string representation of the error type for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::Unauthenticated { .. } => "authentication_error",
            Self::Provider { .. } => "provider_error",
            Self::Configuration { .. } => "configuration_error",
        }
    }
}

/// Converts the error into a JSON response, attaching a `WWW-Authenticate`
/// header when the rejecting provider supplied a challenge.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
                "type": self.error_type(),
            }
        });

        let mut response = (status, Json(body)).into_response();

        if let Some(value) = self.challenge().and_then(|c| HeaderValue::from_str(c).ok()) {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_failures_map_to_401() {
        let rejected = AuthError::unauthorized("jwt", None, "expired");
        assert_eq!(rejected.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(rejected.to_string(), "expired");

        let generic = AuthError::unauthenticated();
        assert_eq!(generic.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(generic.to_string(), GENERIC_FAILURE_MESSAGE);

        assert!(rejected.is_authentication_failure());
        assert!(!AuthError::provider("oauth2", "down").is_authentication_failure());
    }

    #[test]
    fn test_response_carries_challenge_header() {
        let err = AuthError::unauthorized("basic", Some("Basic realm=\"api\"".to_string()), "nope");
        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"api\""
        );
    }

    #[test]
    fn test_generic_response_has_no_challenge() {
        let response = AuthError::unauthenticated().into_response();
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
