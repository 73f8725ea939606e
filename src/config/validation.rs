//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate backend addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no backend address provided")]
    NoBackends,

    #[error("invalid backend address {0:?}")]
    InvalidBackend(String),

    #[error("cache is enabled but cache size is 0")]
    ZeroCacheSize,

    #[error("cache max_body_bytes must be greater than 0")]
    ZeroMaxBodyBytes,

    #[error("invalid {field} {value:?}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    for backend in &config.backends {
        if !is_valid_backend(backend) {
            errors.push(ValidationError::InvalidBackend(backend.clone()));
        }
    }

    if config.cache.enabled && config.cache.size == 0 {
        errors.push(ValidationError::ZeroCacheSize);
    }
    if config.cache.max_body_bytes == Some(0) {
        errors.push(ValidationError::ZeroMaxBodyBytes);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A backend must be a bare `host:port` authority, no scheme or path.
fn is_valid_backend(addr: &str) -> bool {
    !addr.trim().is_empty()
        && !addr.contains('@')
        && addr
            .parse::<Authority>()
            .map(|a| a.as_str() == addr)
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.backends = vec!["127.0.0.1:3000".into(), "backend.local:80".into()];
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid();
        config.backends = vec![];
        config.cache.enabled = true;
        config.cache.size = 0;
        config.listener.bind_address = "nope".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::NoBackends));
        assert!(errors.contains(&ValidationError::ZeroCacheSize));
    }

    #[test]
    fn test_rejects_urls_as_backends() {
        let mut config = valid();
        config.backends.push("http://127.0.0.1:3000".into());
        config.backends.push("127.0.0.1:3000/path".into());
        config.backends.push(" ".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_disabled_cache_size_ignored() {
        let mut config = valid();
        config.cache.size = 0;
        assert!(validate_config(&config).is_ok());
    }
}
