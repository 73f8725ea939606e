//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the load balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Backend addresses (`host:port`), in round-robin order.
    pub backends: Vec<String>,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Outbound transport (connection pool) settings.
    pub transport: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable response caching.
    pub enabled: bool,

    /// Maximum number of cached responses.
    pub size: usize,

    /// Responses announcing a larger `Content-Length` bypass the cache.
    /// Unbounded when unset.
    pub max_body_bytes: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 64,
            max_body_bytes: None,
        }
    }
}

/// Outbound transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Backend connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// TCP keepalive interval in seconds.
    pub keepalive_secs: u64,

    /// How long an idle pooled connection is kept, in seconds.
    pub idle_timeout_secs: u64,

    /// Maximum idle connections kept per backend.
    pub max_idle_per_host: usize,

    /// Speak HTTP/2 (prior knowledge) to backends.
    pub http2_only: bool,
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            keepalive_secs: 10,
            idle_timeout_secs: 10,
            max_idle_per_host: 100,
            http2_only: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:8888".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml() {
        let config: ProxyConfig = toml::from_str(
            r#"
            backends = ["127.0.0.1:3000", "127.0.0.1:3001"]

            [cache]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.backends.len(), 2);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.size, 64);
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.transport.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_json_log_format() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [observability]
            log_format = "json"
            metrics_enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert!(!config.observability.metrics_enabled);
    }
}
