//! # API Authenticator
//!
//! Route-level authentication dispatch for axum/tower services. Requests to routes marked
//! `protected` are authenticated against an ordered list of pluggable providers (HTTP
//! Basic, JWT, OAuth2 bearer tokens); the first provider that accepts the request wins,
//! and the resolved identity is made available to downstream handlers.
//!
//! ## Module Layout
//!
//! - [`core`]: error type, configuration and shared request/user types
//! - [`routing`]: route metadata read to decide whether a request needs authentication
//! - [`auth`]: providers, the provider registry, the per-request authenticator and the
//!   tower middleware
//! - [`observability`]: structured logging setup

pub mod core;

pub mod routing;

pub mod auth;

pub mod observability;

pub use crate::core::error::{AuthError, AuthResult};

pub use crate::core::config::AuthConfig;

pub use crate::core::types::{AuthRequest, InternalRequest, SessionUser, User, UserId};

pub use routing::RouteDescriptor;

pub use auth::{AuthLayer, AuthOutcome, Authenticator, ProviderRegistry};
