//! # Authentication Module
//!
//! Route-level authentication over an ordered set of pluggable providers.
//!
//! - [`providers`]: the provider contract and the basic, JWT and OAuth2 providers
//! - [`registry`]: the immutable, ordered provider registry and its builder
//! - [`identity`]: per-request identity guard over a shared user store
//! - [`authenticator`]: the per-request dispatcher
//! - [`middleware`]: the tower layer that wires it into a request pipeline

pub mod authenticator;
pub mod identity;
pub mod middleware;
pub mod providers;
pub mod registry;


pub use authenticator::{AuthOutcome, Authenticator, SkipReason};
pub use identity::{InMemoryUserProvider, RequestGuard, UserProvider};
pub use middleware::{AuthLayer, AuthService};
pub use providers::{AuthProvider, ProviderContext, ProviderOutcome, Rejection};
pub use registry::{ProviderBackends, ProviderRegistry, ProviderRegistryBuilder, OAUTH2_PROVIDER};
