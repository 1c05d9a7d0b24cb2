//! # Authentication Integration Tests
//!
//! Drives an axum `Router` guarded by [`AuthLayer`] end to end:
//! - public and protected routes
//! - Basic, JWT and OAuth2 credentials in configured precedence order
//! - 401 responses and `WWW-Authenticate` challenges
//! - internal requests and user resolution in handlers
//! - host-supplied session users and the extensions the layer leaves for handlers

use api_authenticator::auth::providers::{
    AccessToken, InMemoryCredentials, InMemoryTokenStore, JwtClaims,
};
use api_authenticator::auth::middleware::utils;
use api_authenticator::auth::{AuthOutcome, InMemoryUserProvider, ProviderBackends};
use api_authenticator::core::config::ProviderKind;
use api_authenticator::core::error::GENERIC_FAILURE_MESSAGE;
use api_authenticator::{
    AuthConfig, AuthError, AuthLayer, Authenticator, InternalRequest, ProviderRegistry,
    RouteDescriptor, SessionUser, User, UserId,
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    routing::get,
    Extension, Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

const JWT_SECRET: &str = "integration-secret";

async fn me(Extension(mut auth): Extension<Authenticator>) -> Result<Json<Value>, AuthError> {
    let user = auth.user().await?;
    Ok(Json(json!({ "user": user })))
}

/// Reports what the auth layer left in the request extensions
async fn whoami(request: Request<Body>) -> Result<Json<Value>, AuthError> {
    let provider = match request.extensions().get::<AuthOutcome>() {
        Some(AuthOutcome::Authenticated { provider, .. }) => Some(provider.clone()),
        _ => None,
    };
    let authenticated = utils::is_authenticated(&request);
    let user_id = utils::get_user_id(&request);

    let mut auth = utils::get_authenticator(&request).ok_or_else(AuthError::unauthenticated)?;
    let user = auth.user().await?;

    Ok(Json(json!({
        "user": user,
        "authenticated": authenticated,
        "provider": provider,
        "user_id": user_id,
    })))
}

async fn open() -> &'static str {
    "open"
}

fn app() -> Router {
    let users = Arc::new(InMemoryUserProvider::new());
    users.insert(User::new("42", "Ada Lovelace").with_email("ada@example.com"));
    users.insert(User::new("7", "Grace Hopper"));

    let credentials = Arc::new(InMemoryCredentials::new());
    credentials.insert("ada", "engine", "42");

    let tokens = Arc::new(InMemoryTokenStore::new());
    tokens.insert(AccessToken::for_user("reader-token", "42").with_scopes(["reports.read"]));
    tokens.insert(AccessToken::for_user("plain-token", "42"));

    let mut config = AuthConfig::default();
    config.providers = vec![ProviderKind::Jwt, ProviderKind::Basic, ProviderKind::OAuth2];
    config.jwt.secret = JWT_SECRET.to_string();
    config.basic.realm = "integration".to_string();

    let backends = ProviderBackends::default()
        .with_credentials(credentials)
        .with_tokens(tokens);
    let registry = ProviderRegistry::from_config(&config, backends).unwrap();
    let auth = AuthLayer::new(registry, users);

    Router::new()
        .route("/open", get(open).layer(auth.clone()))
        .route(
            "/me",
            get(me)
                .layer::<_, std::convert::Infallible>(auth.clone())
                .layer(Extension(RouteDescriptor::new().protected())),
        )
        .route(
            "/reports",
            get(me).layer::<_, std::convert::Infallible>(auth.clone()).layer(Extension(
                RouteDescriptor::new()
                    .with_attribute("protected", json!(true))
                    .with_scopes(["reports.read"]),
            )),
        )
        .route(
            "/whoami",
            get(whoami)
                .layer::<_, std::convert::Infallible>(auth.clone())
                .layer(Extension(RouteDescriptor::new().protected())),
        )
        .route(
            "/session",
            get(whoami)
                .layer::<_, std::convert::Infallible>(auth.clone())
                .layer::<_, std::convert::Infallible>(Extension(RouteDescriptor::new().protected()))
                .layer(Extension(SessionUser(UserId::from("7")))),
        )
        .route(
            "/internal",
            get(me)
                .layer::<_, std::convert::Infallible>(auth)
                .layer::<_, std::convert::Infallible>(Extension(RouteDescriptor::new().protected()))
                .layer(Extension(InternalRequest)),
        )
}

fn jwt(sub: &str, expires_in: i64) -> String {
    let claims = JwtClaims {
        sub: sub.to_string(),
        exp: Utc::now().timestamp() + expires_in,
        iat: None,
        iss: None,
        aud: None,
        extra: HashMap::new(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

async fn send(uri: &str, authorization: Option<String>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    app().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn basic(user: &str, password: &str) -> Option<String> {
    Some(format!("Basic {}", STANDARD.encode(format!("{}:{}", user, password))))
}

#[tokio::test]
async fn test_open_route_needs_no_credentials() {
    let response = send("/open", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Garbage credentials are ignored on unprotected routes
    let response = send("/open", Some("Bearer garbage".to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_without_credentials() {
    let response = send("/me", None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());

    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], GENERIC_FAILURE_MESSAGE);
    assert_eq!(body["error"]["code"], 401);
}

#[tokio::test]
async fn test_basic_credentials() {
    let response = send("/me", basic("ada", "engine")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["user"]["name"], "Ada Lovelace");
    assert_eq!(body["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_wrong_basic_password_carries_challenge() {
    let response = send("/me", basic("ada", "difference")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Basic realm=\"integration\""
    );
    let body = json_body(response).await;
    assert_eq!(body["error"]["type"], "unauthorized");
}

#[tokio::test]
async fn test_jwt_bearer_and_query_token() {
    let response = send("/me", Some(format!("Bearer {}", jwt("42", 600)))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&format!("/me?token={}", jwt("42", 600)), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_oauth2_token_wins_after_jwt_rejection() {
    // The JWT provider runs first and rejects the opaque token; OAuth2 accepts it.
    let response = send("/me", Some("Bearer plain-token".to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_bearer_reports_first_rejection() {
    let response = send("/me", Some("Bearer unknown".to_string())).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    let body = json_body(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid token"));
}

#[tokio::test]
async fn test_route_scopes_are_enforced() {
    let response = send("/reports", Some("Bearer reader-token".to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send("/reports", Some("Bearer plain-token".to_string())).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_internal_request_bypasses_authentication() {
    let response = send("/internal", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["user"], Value::Null);
}

#[tokio::test]
async fn test_outcome_reaches_handler() {
    let response = send("/whoami", basic("ada", "engine")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["provider"], "basic");
    assert_eq!(body["user_id"], "42");
    assert_eq!(body["user"]["name"], "Ada Lovelace");
}

#[tokio::test]
async fn test_session_user_takes_precedence() {
    let response = send("/session", basic("ada", "engine")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    // The provider still authenticated ada ...
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["provider"], "basic");
    assert_eq!(body["user_id"], "42");
    // ... but the host's session user is the one handlers see
    assert_eq!(body["user"]["id"], "7");
    assert_eq!(body["user"]["name"], "Grace Hopper");
}

#[tokio::test]
async fn test_session_user_still_needs_credentials() {
    let response = send("/session", basic("ada", "difference")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
