//! # Configuration Module
//!
//! Configuration for the authentication layer: which providers are enabled and in which
//! order they are tried, per-provider settings, logging, and the bind address of the
//! demo server.
//!
//! ## Key Features
//! - YAML configuration parsing with serde
//! - Environment variable override support (`AUTH_<FIELD>`)
//! - Validation that reports every problem at once

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::auth::providers::JwtConfig;
use crate::core::error::{AuthError, AuthResult};
use crate::observability::config::LogConfig;
use crate::observability::logging::parse_level;

/// The provider schemes that can be enabled from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "basic")]
    Basic,
    #[serde(rename = "jwt")]
    Jwt,
    #[serde(rename = "oauth2")]
    OAuth2,
}

impl ProviderKind {
    /// Registry key the provider is registered under
    pub fn key(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Jwt => "jwt",
            Self::OAuth2 => "oauth2",
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Enabled providers, in the order they are tried
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderKind>,

    #[serde(default)]
    pub basic: BasicConfig,

    #[serde(default)]
    pub jwt: JwtConfig,

    #[serde(default)]
    pub logging: LogConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// HTTP Basic provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicConfig {
    /// Realm announced in the `WWW-Authenticate` challenge
    pub realm: String,
}

/// Listener settings for the bundled server binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
}

fn default_providers() -> Vec<ProviderKind> {
    vec![ProviderKind::Basic, ProviderKind::OAuth2]
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            realm: "api".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            basic: BasicConfig::default(),
            jwt: JwtConfig::default(),
            logging: LogConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Load configuration from a YAML file, apply environment overrides and validate
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> AuthResult<Self> {
        let mut config = Self::read_from_file(path).await?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML file as-is, ignoring the environment
    pub async fn read_from_file<P: AsRef<Path>>(path: P) -> AuthResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuthError::config(format!("Failed to read config file: {}", e)))?;

        Self::from_yaml_str(&content)
    }

    /// Parse configuration from YAML without overrides or validation
    pub fn from_yaml_str(content: &str) -> AuthResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| AuthError::config(format!("Failed to parse config: {}", e)))
    }

    /// Apply environment variable overrides to configuration
    ///
    /// Recognized: `AUTH_JWT_SECRET`, `AUTH_LOG_LEVEL`, `AUTH_BIND_ADDRESS`, and
    /// `AUTH_PROVIDERS` (comma separated, e.g. `jwt,oauth2`).
    pub fn apply_env_overrides(&mut self) -> AuthResult<()> {
        use std::env;

        if let Ok(secret) = env::var("AUTH_JWT_SECRET") {
            self.jwt.secret = secret;
        }

        if let Ok(level) = env::var("AUTH_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(addr) = env::var("AUTH_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }

        if let Ok(list) = env::var("AUTH_PROVIDERS") {
            self.providers = parse_provider_list(&list)?;
        }

        Ok(())
    }

    /// Validate the configuration, reporting all problems together
    pub fn validate(&self) -> AuthResult<()> {
        let mut errors = Vec::new();

        for (index, kind) in self.providers.iter().enumerate() {
            if self.providers[..index].contains(kind) {
                errors.push(format!("Provider '{}' is listed more than once", kind.key()));
            }
        }

        if self.providers.contains(&ProviderKind::Jwt) && self.jwt.secret.is_empty() {
            errors.push("jwt.secret must be set when the jwt provider is enabled".to_string());
        }

        if self.providers.contains(&ProviderKind::Basic) && self.basic.realm.is_empty() {
            errors.push("basic.realm cannot be empty".to_string());
        }

        if let Err(err) = parse_level(&self.logging.level) {
            errors.push(err.to_string());
        }

        if self.server.bind_address.is_empty() {
            errors.push("bind_address cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AuthError::config(errors.join("; ")))
        }
    }
}

fn parse_provider_list(list: &str) -> AuthResult<Vec<ProviderKind>> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| match name {
            "basic" => Ok(ProviderKind::Basic),
            "jwt" => Ok(ProviderKind::Jwt),
            "oauth2" => Ok(ProviderKind::OAuth2),
            other => Err(AuthError::config(format!("Unknown provider in AUTH_PROVIDERS: {}", other))),
        })
        .collect()
}
