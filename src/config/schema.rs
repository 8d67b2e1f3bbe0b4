//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::dispatch::Priority;

/// Root configuration for the dispatch server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Shared access policy applied by every handler.
    pub access: AccessConfig,

    /// Adjustments to the compiled-in handler registrations.
    pub registrations: Vec<RegistrationOverride>,
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

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Access policy shared by all handlers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Methods handlers accept. Anything else is answered with 405.
    pub allowed_methods: Vec<String>,

    /// When set, requests must carry `Authorization: Bearer <token>`.
    pub bearer_token: Option<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allowed_methods: vec!["GET".to_string(), "HEAD".to_string(), "POST".to_string()],
            bearer_token: None,
            max_body_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Override for one compiled-in handler registration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationOverride {
    /// Name of the handler to adjust.
    pub handler: String,

    /// Serve the handler under a different route index.
    #[serde(default)]
    pub index: Option<String>,

    /// Register the handler with a different priority.
    #[serde(default)]
    pub priority: Option<Priority>,

    /// Set to false to leave the handler out of the registry.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.access.allowed_methods, vec!["GET", "HEAD", "POST"]);
        assert!(config.access.bearer_token.is_none());
        assert!(config.registrations.is_empty());
    }

    #[test]
    fn test_registration_overrides() {
        let config: ServerConfig = toml::from_str(
            r#"
            [[registrations]]
            handler = "basic-functionality"
            priority = "high"

            [[registrations]]
            handler = "other"
            index = "elsewhere"
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.registrations.len(), 2);
        assert_eq!(config.registrations[0].priority, Some(Priority::High));
        assert!(config.registrations[0].enabled);
        assert_eq!(config.registrations[1].index.as_deref(), Some("elsewhere"));
        assert!(!config.registrations[1].enabled);
    }
}
