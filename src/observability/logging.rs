//! # Structured Logging
//!
//! Installs the global `tracing` subscriber: an `EnvFilter` seeded from `RUST_LOG` with the
//! configured level as default directive, and a JSON or plain-text `fmt` layer.

use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::core::error::{AuthError, AuthResult};
use crate::observability::config::{LogConfig, LogFormat};

/// Parse a textual log level
pub fn parse_level(level: &str) -> AuthResult<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(AuthError::config(format!("Invalid log level: {}", other))),
    }
}

/// Initialize the tracing subscriber.
///
/// An already installed global subscriber is left in place.
pub fn init_logging(config: &LogConfig) -> AuthResult<()> {
    let level = parse_level(&config.level)?;
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let installed = match config.format {
        LogFormat::Json => Registry::default()
            .with(env_filter)
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init(),
        LogFormat::Text => Registry::default()
            .with(env_filter)
            .with(fmt::layer().with_target(true))
            .try_init(),
    };

    if installed.is_err() {
        warn!("Tracing subscriber already initialized, skipping initialization");
        return Ok(());
    }

    info!(level = %level, format = ?config.format, "Structured logging initialized");
    Ok(())
}
