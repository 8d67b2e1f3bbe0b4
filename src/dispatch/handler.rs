//! Handler capability and the shared access helper.
//!
//! # Data Flow
//! ```text
//! Dispatcher
//!     → factory(HandlerContext) creates a fresh handler
//!     → handler.handle(exchange)
//!         → access.set_http_exchange(exchange)  (AlreadyHandled → return)
//!         → access.respond(exchange, status, body)
//! ```
//!
//! # Design Decisions
//! - One handler instance per request; nothing is shared across requests
//!   except the read-only policy
//! - The early-exit signal is an explicit `Admission` value, not a bool

use std::sync::Arc;

use crate::dispatch::exchange::{Exchange, ExchangeError};
use crate::security::AccessPolicy;

/// Result of binding an exchange to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Admission {
    /// The request passed the access gate; the handler should answer it.
    Continue,
    /// The request was already answered (or rejected); return immediately.
    AlreadyHandled,
}

impl Admission {
    pub fn is_handled(self) -> bool {
        matches!(self, Admission::AlreadyHandled)
    }
}

/// Unexpected failure inside a handler.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

/// Entry point implemented by every request handler.
pub trait Handler: Send {
    /// Serve one request. Called exactly once per handler instance.
    fn handle(&mut self, exchange: &mut Exchange) -> Result<(), HandlerError>;
}

/// What a handler factory receives when the dispatcher creates a handler.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    policy: Arc<AccessPolicy>,
}

impl HandlerContext {
    pub fn new(policy: Arc<AccessPolicy>) -> Self {
        Self { policy }
    }

    /// Shared access helper for a new handler instance.
    pub fn access_handler(&self) -> AccessHandler {
        AccessHandler::new(self.policy.clone())
    }
}

impl Default for HandlerContext {
    fn default() -> Self {
        Self::new(Arc::new(AccessPolicy::default()))
    }
}

/// Behaviour every concrete handler reuses: the access gate and the
/// single-write response helper.
#[derive(Debug, Clone)]
pub struct AccessHandler {
    policy: Arc<AccessPolicy>,
    admitted: bool,
}

impl AccessHandler {
    pub fn new(policy: Arc<AccessPolicy>) -> Self {
        Self {
            policy,
            admitted: false,
        }
    }

    /// Bind the exchange and run the shared precondition checks.
    ///
    /// Returns `AlreadyHandled` when the exchange is already answered or
    /// closed, or when the policy rejected it. In the rejection case the
    /// error response has been written before returning.
    pub fn set_http_exchange(&mut self, exchange: &mut Exchange) -> Admission {
        if exchange.is_responded() || exchange.is_closed() {
            return Admission::AlreadyHandled;
        }

        match self.policy.check(exchange) {
            Ok(()) => {
                self.admitted = true;
                Admission::Continue
            }
            Err(rejection) => {
                tracing::debug!(
                    path = %exchange.path(),
                    method = %exchange.method(),
                    status = rejection.status.as_u16(),
                    reason = rejection.message,
                    "Request rejected by access policy"
                );
                self.respond(exchange, rejection.status.as_u16(), rejection.message);
                Admission::AlreadyHandled
            }
        }
    }

    /// Whether the last bound exchange passed the access gate.
    pub fn is_admitted(&self) -> bool {
        self.admitted
    }

    /// Write the response. Duplicate writes and writes to a closed exchange
    /// are logged and dropped.
    pub fn respond(&self, exchange: &mut Exchange, status: u16, body: impl Into<String>) {
        if let Err(e) = exchange.respond(status, body) {
            match e {
                ExchangeError::Closed => {
                    tracing::debug!(path = %exchange.path(), "Exchange closed before response");
                }
                e => {
                    tracing::warn!(path = %exchange.path(), status, error = %e, "Dropped response write");
                }
            }
        }
    }
}
