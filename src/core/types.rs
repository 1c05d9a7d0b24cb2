//! # Core Types
//!
//! Data structures shared between the authenticator, the providers and the middleware:
//! user identities, the borrowed request view handed to providers, and the marker used
//! to flag framework-internal requests.

use axum::http::{header, request::Parts, HeaderMap, Method, Request, Uri};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::routing::RouteDescriptor;

/// Identifier of an authenticated principal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A resolved user, as returned by the identity layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: UserId,

    /// Display name
    pub name: String,

    /// Contact address, if known
    #[serde(default)]
    pub email: Option<String>,

    /// Roles granted to the user
    #[serde(default)]
    pub roles: Vec<String>,

    /// Free-form attributes from the user store
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl User {
    pub fn new<I: Into<UserId>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            roles: Vec::new(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role<S: Into<String>>(mut self, role: S) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Request extension marking a request the framework dispatched to itself.
///
/// Internal requests are never re-authenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalRequest;

/// Request extension carrying the user of an existing durable session.
///
/// Inserted by the host's session layer when one is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser(pub UserId);

/// Borrowed view of the current request handed to the authenticator and providers.
#[derive(Debug, Clone, Copy)]
pub struct AuthRequest<'a> {
    pub method: &'a Method,
    pub uri: &'a Uri,
    pub headers: &'a HeaderMap,
    /// The route the routing layer matched, if any
    pub route: Option<&'a RouteDescriptor>,
    /// Whether this is a framework-internal dispatch
    pub internal: bool,
}

impl<'a> AuthRequest<'a> {
    /// Build a view over an HTTP request, picking the route descriptor and the
    /// internal marker out of its extensions.
    pub fn from_http<B>(request: &'a Request<B>) -> Self {
        let extensions = request.extensions();

        Self {
            method: request.method(),
            uri: request.uri(),
            headers: request.headers(),
            route: extensions.get::<RouteDescriptor>(),
            internal: extensions.get::<InternalRequest>().is_some(),
        }
    }

    /// Same as [`from_http`](Self::from_http) for a request split into parts
    pub fn from_parts(parts: &'a Parts) -> Self {
        Self {
            method: &parts.method,
            uri: &parts.uri,
            headers: &parts.headers,
            route: parts.extensions.get::<RouteDescriptor>(),
            internal: parts.extensions.get::<InternalRequest>().is_some(),
        }
    }

    pub fn with_route(mut self, route: &'a RouteDescriptor) -> Self {
        self.route = Some(route);
        self
    }

    pub fn mark_internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// Get a header value as a string, ignoring non-ASCII values
    pub fn header(&self, name: header::HeaderName) -> Option<&'a str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Extract the credentials following `scheme` in the `Authorization` header.
    ///
    /// The scheme comparison is case-insensitive.
    pub fn authorization(&self, scheme: &str) -> Option<&'a str> {
        let value = self.header(header::AUTHORIZATION)?.trim();
        let (given, rest) = value.split_once(' ')?;

        if given.eq_ignore_ascii_case(scheme) {
            Some(rest.trim())
        } else {
            None
        }
    }

    /// Bearer token from the `Authorization` header
    pub fn bearer_token(&self) -> Option<&'a str> {
        self.authorization("Bearer").filter(|token| !token.is_empty())
    }

    /// Decoded value of a query string parameter
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.uri.query()?.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key != name {
                return None;
            }
            urlencoding::decode(value).ok().map(|v| v.into_owned())
        })
    }
}
