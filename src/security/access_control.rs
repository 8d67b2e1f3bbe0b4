//! Access policy enforced by every handler before it does any work.
//!
//! Checks run in order: method, bearer token, body size. The first failing
//! check decides the rejection status.

use axum::http::{header, Method, StatusCode};

use crate::config::AccessConfig;
use crate::dispatch::Exchange;

/// A rejected request: the status and body to answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub status: StatusCode,
    pub message: &'static str,
}

impl Rejection {
    fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }
}

/// Shared access policy, built once from configuration.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    allowed_methods: Vec<Method>,
    bearer_token: Option<String>,
    max_body_bytes: usize,
}

impl AccessPolicy {
    /// Build a policy from configuration.
    ///
    /// Method names that fail to parse are skipped with a warning; config
    /// validation rejects them before this point in normal startup.
    pub fn from_config(config: &AccessConfig) -> Self {
        let allowed_methods = config
            .allowed_methods
            .iter()
            .filter_map(|m| match Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes()) {
                Ok(method) => Some(method),
                Err(_) => {
                    tracing::warn!(method = %m, "Ignoring invalid method in access policy");
                    None
                }
            })
            .collect();

        Self {
            allowed_methods,
            bearer_token: config.bearer_token.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Evaluate the policy against an exchange.
    pub fn check(&self, exchange: &Exchange) -> Result<(), Rejection> {
        // Empty list means any method
        if !self.allowed_methods.is_empty() && !self.allowed_methods.contains(exchange.method()) {
            return Err(Rejection::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"));
        }

        if let Some(token) = &self.bearer_token {
            let presented = exchange
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "));

            match presented {
                None => {
                    return Err(Rejection::new(StatusCode::UNAUTHORIZED, "Missing bearer token"));
                }
                Some(presented) if presented != token => {
                    return Err(Rejection::new(StatusCode::UNAUTHORIZED, "Invalid bearer token"));
                }
                Some(_) => {}
            }
        }

        if exchange.body().len() > self.max_body_bytes {
            return Err(Rejection::new(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"));
        }

        Ok(())
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::from_config(&AccessConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, Uri};

    fn policy_with_token(token: &str) -> AccessPolicy {
        AccessPolicy::from_config(&AccessConfig {
            bearer_token: Some(token.to_string()),
            ..AccessConfig::default()
        })
    }

    #[test]
    fn test_default_policy_admits_get() {
        let policy = AccessPolicy::default();
        assert!(policy.check(&Exchange::get("/test")).is_ok());
    }

    #[test]
    fn test_method_not_allowed() {
        let policy = AccessPolicy::default();
        let exchange = Exchange::new(Method::DELETE, Uri::from_static("/test"));
        let rejection = policy.check(&exchange).unwrap_err();
        assert_eq!(rejection.status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_lowercase_methods_in_config() {
        let policy = AccessPolicy::from_config(&AccessConfig {
            allowed_methods: vec!["delete".to_string()],
            ..AccessConfig::default()
        });
        let exchange = Exchange::new(Method::DELETE, Uri::from_static("/test"));
        assert!(policy.check(&exchange).is_ok());
        assert!(policy.check(&Exchange::get("/test")).is_err());
    }

    #[test]
    fn test_bearer_token() {
        let policy = policy_with_token("s3cret");

        let missing = policy.check(&Exchange::get("/test")).unwrap_err();
        assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
        assert_eq!(missing.message, "Missing bearer token");

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer wrong".parse().unwrap());
        let wrong = policy.check(&Exchange::get("/test").with_headers(headers)).unwrap_err();
        assert_eq!(wrong.message, "Invalid bearer token");

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer s3cret".parse().unwrap());
        assert!(policy.check(&Exchange::get("/test").with_headers(headers)).is_ok());
    }

    #[test]
    fn test_body_limit() {
        let policy = AccessPolicy::from_config(&AccessConfig {
            max_body_bytes: 4,
            ..AccessConfig::default()
        });
        let exchange = Exchange::new(Method::POST, Uri::from_static("/test")).with_body("too long");
        let rejection = policy.check(&exchange).unwrap_err();
        assert_eq!(rejection.status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_empty_method_list_admits_any() {
        let policy = AccessPolicy::from_config(&AccessConfig {
            allowed_methods: Vec::new(),
            ..AccessConfig::default()
        });
        let exchange = Exchange::new(Method::PATCH, Uri::from_static("/test"));
        assert!(policy.check(&exchange).is_ok());
    }
}
