//! # Routing Metadata
//!
//! Route matching itself belongs to the host framework. This module only describes the
//! metadata the routing layer attaches to a matched route, which the authenticator reads
//! to decide whether a request must be authenticated and which OAuth2 scopes it needs.

pub mod route;

pub use route::{RouteDescriptor, PROTECTED_MARKER, SCOPES_KEY};
