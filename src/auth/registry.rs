//! # Provider Registry
//!
//! The ordered set of authentication providers, keyed by name. Insertion order is
//! precedence order. A registry is assembled once at startup through
//! [`ProviderRegistryBuilder`] and is immutable afterwards; cloning it only clones an `Arc`.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::auth::providers::{
    AuthProvider, BasicProvider, CredentialVerifier, JwtProvider, OAuth2Provider,
    TokenIntrospector,
};
use crate::core::config::{AuthConfig, ProviderKind};
use crate::core::error::{AuthError, AuthResult};

/// Key of the provider that receives the route's scopes
pub const OAUTH2_PROVIDER: &str = "oauth2";

#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Arc<IndexMap<String, Arc<dyn AuthProvider>>>,
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Build the registry described by `config`, in its configured order.
    ///
    /// Basic and OAuth2 providers need their backing stores in `backends`.
    pub fn from_config(config: &AuthConfig, backends: ProviderBackends) -> AuthResult<Self> {
        let mut builder = Self::builder();

        for kind in &config.providers {
            builder = match kind {
                ProviderKind::Basic => {
                    let verifier = backends.credentials.clone().ok_or_else(|| {
                        AuthError::config("basic provider enabled without a credential store")
                    })?;
                    builder.extend(kind.key(), BasicProvider::new(verifier, &config.basic.realm))
                }
                ProviderKind::Jwt => {
                    builder.extend(kind.key(), JwtProvider::new(config.jwt.clone())?)
                }
                ProviderKind::OAuth2 => {
                    let introspector = backends.tokens.clone().ok_or_else(|| {
                        AuthError::config("oauth2 provider enabled without a token store")
                    })?;
                    builder.extend(kind.key(), OAuth2Provider::new(introspector))
                }
            };
        }

        let registry = builder.build();
        tracing::info!(providers = ?registry.keys().collect::<Vec<_>>(), "Provider registry built");
        Ok(registry)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.providers.contains_key(key)
    }

    /// Providers in precedence order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn AuthProvider>)> {
        self.providers.iter().map(|(key, provider)| (key.as_str(), provider))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Stores the configurable providers delegate credential checks to
#[derive(Clone, Default)]
pub struct ProviderBackends {
    pub credentials: Option<Arc<dyn CredentialVerifier>>,
    pub tokens: Option<Arc<dyn TokenIntrospector>>,
}

impl ProviderBackends {
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialVerifier>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_tokens(mut self, tokens: Arc<dyn TokenIntrospector>) -> Self {
        self.tokens = Some(tokens);
        self
    }
}

#[derive(Default)]
pub struct ProviderRegistryBuilder {
    providers: IndexMap<String, Arc<dyn AuthProvider>>,
}

impl ProviderRegistryBuilder {
    /// Register a provider under `key`, replacing any provider already there.
    ///
    /// A replaced provider keeps its original position in the order.
    pub fn extend<K, P>(self, key: K, provider: P) -> Self
    where
        K: Into<String>,
        P: AuthProvider + 'static,
    {
        self.extend_shared(key, Arc::new(provider))
    }

    /// Like [`extend`](Self::extend) for a provider that is already shared
    pub fn extend_shared<K: Into<String>>(mut self, key: K, provider: Arc<dyn AuthProvider>) -> Self {
        let key = key.into();
        if self.providers.insert(key.clone(), provider).is_some() {
            tracing::debug!(provider = %key, "Replaced authentication provider");
        }
        self
    }

    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            providers: Arc::new(self.providers),
        }
    }
}
