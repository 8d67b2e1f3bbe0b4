//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges and addresses
//! - Check registration overrides are well-formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Override handler names are resolved later, against the registration list

use std::fmt;
use std::net::SocketAddr;

use axum::http::Method;

use crate::config::schema::ServerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const LOG_FORMATS: [&str; 2] = ["pretty", "json"];

/// Validate a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let observability = &config.observability;
    if !LOG_FORMATS.contains(&observability.log_format.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("'{}' is not one of pretty, json", observability.log_format),
        ));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    let access = &config.access;
    if access.allowed_methods.is_empty() {
        errors.push(ValidationError::new("access.allowed_methods", "must list at least one method"));
    }
    for method in &access.allowed_methods {
        if Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes()).is_err() {
            errors.push(ValidationError::new(
                "access.allowed_methods",
                format!("'{}' is not a valid HTTP method", method),
            ));
        }
    }
    if matches!(&access.bearer_token, Some(token) if token.trim().is_empty()) {
        errors.push(ValidationError::new("access.bearer_token", "must not be empty when set"));
    }

    for (i, o) in config.registrations.iter().enumerate() {
        if o.handler.trim().is_empty() {
            errors.push(ValidationError::new(
                format!("registrations[{}].handler", i),
                "must not be empty",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
