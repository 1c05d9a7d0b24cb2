//! # API Authenticator - Demo Server
//!
//! Serves a small axum application guarded by the authentication layer:
//!
//! - `GET /health`: public
//! - `GET /me`: protected, returns the authenticated user
//! - `GET /reports`: protected, requires the `reports.read` OAuth2 scope
//!
//! Configuration is read from the YAML file named by `AUTH_CONFIG`, falling back to
//! defaults. Demo users, credentials and tokens are seeded in memory.

use axum::{extract::Request, routing::get, Extension, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use api_authenticator::auth::providers::{AccessToken, InMemoryCredentials, InMemoryTokenStore};
use api_authenticator::auth::middleware::utils;
use api_authenticator::auth::{InMemoryUserProvider, ProviderBackends};
use api_authenticator::observability::init_logging;
use api_authenticator::{
    AuthConfig, AuthError, AuthLayer, AuthResult, Authenticator, ProviderRegistry, RouteDescriptor,
    User,
};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn me(Extension(mut auth): Extension<Authenticator>) -> Result<Json<Value>, AuthError> {
    let user = auth.user().await?;
    Ok(Json(json!({ "user": user })))
}

async fn reports(request: Request) -> Json<Value> {
    Json(json!({ "reports": [], "requested_by": utils::get_user_id(&request) }))
}

fn seed_backends(users: &InMemoryUserProvider) -> ProviderBackends {
    users.insert(User::new("1", "Demo User").with_email("demo@example.com"));

    let credentials = Arc::new(InMemoryCredentials::new());
    credentials.insert("demo", "demo", "1");

    let tokens = Arc::new(InMemoryTokenStore::new());
    tokens.insert(AccessToken::for_user("demo-token", "1").with_scopes(["reports.read"]));

    ProviderBackends::default()
        .with_credentials(credentials)
        .with_tokens(tokens)
}

#[tokio::main]
async fn main() -> AuthResult<()> {
    let config = match std::env::var("AUTH_CONFIG") {
        Ok(path) => AuthConfig::load_from_file(path).await?,
        Err(_) => {
            let mut config = AuthConfig::default();
            config.apply_env_overrides()?;
            config.validate()?;
            config
        }
    };

    init_logging(&config.logging)?;

    let users = Arc::new(InMemoryUserProvider::new());
    let registry = ProviderRegistry::from_config(&config, seed_backends(&users))?;
    let auth = AuthLayer::new(registry, users);

    let app = Router::new()
        .route("/health", get(health).layer(auth.clone()))
        .route(
            "/me",
            get(me)
                .layer::<_, std::convert::Infallible>(auth.clone())
                .layer(Extension(RouteDescriptor::new().protected())),
        )
        .route(
            "/reports",
            get(reports).layer::<_, std::convert::Infallible>(auth).layer(Extension(
                RouteDescriptor::new().protected().with_scopes(["reports.read"]),
            )),
        );

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await.map_err(|e| {
        AuthError::config(format!("Failed to bind {}: {}", config.server.bind_address, e))
    })?;
    info!(address = %config.server.bind_address, "Listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| AuthError::config(format!("Server error: {}", e)))
}
