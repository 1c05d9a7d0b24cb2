//! # JWT Token Provider
//!
//! Authenticates requests carrying a signed JSON Web Token, either as a bearer token in
//! the `Authorization` header or in a query string parameter. Tokens are validated with
//! the `jsonwebtoken` crate; the `sub` claim becomes the authenticated user id.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{AuthProvider, ProviderContext, ProviderOutcome, Rejection};
use crate::core::error::{AuthError, AuthResult};
use crate::core::types::{AuthRequest, UserId};

/// JWT provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret used to verify HS256 signatures
    pub secret: String,

    /// Expected `iss` claim, if any
    #[serde(default)]
    pub issuer: Option<String>,

    /// Expected `aud` claim, if any
    #[serde(default)]
    pub audience: Option<String>,

    /// Clock skew tolerated when checking `exp`, in seconds
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,

    /// Query parameter checked when no bearer header is present
    #[serde(default = "default_query_parameter")]
    pub query_parameter: String,
}

fn default_leeway() -> u64 {
    60
}

fn default_query_parameter() -> String {
    "token".to_string()
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: None,
            audience: None,
            leeway_seconds: default_leeway(),
            query_parameter: default_query_parameter(),
        }
    }
}

/// Claims read from a token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

pub struct JwtProvider {
    decoding_key: DecodingKey,
    validation: Validation,
    query_parameter: String,
}

impl JwtProvider {
    pub fn new(config: JwtConfig) -> AuthResult<Self> {
        if config.secret.is_empty() {
            return Err(AuthError::config("JWT secret must not be empty"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            query_parameter: config.query_parameter,
        })
    }

    fn token_from(&self, request: &AuthRequest<'_>) -> Option<String> {
        request
            .bearer_token()
            .map(str::to_string)
            .or_else(|| request.query_param(&self.query_parameter))
            .filter(|token| !token.is_empty())
    }
}

#[async_trait]
impl AuthProvider for JwtProvider {
    async fn authenticate(
        &self,
        request: &AuthRequest<'_>,
        _context: &ProviderContext,
    ) -> AuthResult<ProviderOutcome> {
        let Some(token) = self.token_from(request) else {
            return Ok(ProviderOutcome::NotApplicable);
        };

        match decode::<JwtClaims>(&token, &self.decoding_key, &self.validation) {
            Ok(data) => Ok(ProviderOutcome::Authenticated(UserId::new(data.claims.sub))),
            Err(err) => {
                tracing::debug!(error = %err, "JWT validation failed");
                Ok(Rejection::new(format!("Invalid token: {}", err))
                    .with_challenge("Bearer")
                    .into())
            }
        }
    }
}
