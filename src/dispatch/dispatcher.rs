//! Request dispatch.
//!
//! # Responsibilities
//! - Resolve the route index of an exchange
//! - Instantiate the authoritative handler for that index
//! - Contain handler faults (errors and panics) at this boundary
//! - Guarantee exactly one response write per exchange
//!
//! # Design Decisions
//! - First match wins: only the highest-ranked handler of a group runs
//! - Synchronous; the transport decides which thread runs it
//! - Missing route answers 404, faults answer 500

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;

use crate::dispatch::exchange::Exchange;
use crate::dispatch::handler::HandlerContext;
use crate::dispatch::metadata::RouteIndex;
use crate::dispatch::registry::Registry;
use crate::observability::metrics;

pub const NOT_FOUND_BODY: &str = "No handler registered for this route";
pub const SERVER_ERROR_BODY: &str = "Internal server error";

/// How a single dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler ran and answered the exchange.
    Handled { handler: String },
    /// No handler is registered for the request's index.
    RouteNotFound,
    /// The handler failed, panicked, or returned without answering.
    Fault { handler: String },
}

/// Routes exchanges to handlers from a shared registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    context: HandlerContext,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, context: HandlerContext) -> Self {
        Self { registry, context }
    }

    /// Dispatch one exchange. Never panics on handler failure.
    pub fn dispatch(&self, exchange: &mut Exchange) -> DispatchOutcome {
        let start = Instant::now();
        let path = exchange.path().to_string();
        let index = RouteIndex::from_path(&path);

        // 1. Look up the authoritative descriptor
        let descriptor = match index.and_then(|i| self.registry.active(i)) {
            Some(d) => d,
            None => {
                tracing::warn!(
                    request_id = exchange.request_id().unwrap_or("unknown"),
                    path = %path,
                    "No handler registered for route"
                );
                answer(exchange, StatusCode::NOT_FOUND, NOT_FOUND_BODY);
                // Client-chosen segments never become label values
                metrics::record_dispatch(metrics::UNMATCHED_INDEX, status_of(exchange), start);
                return DispatchOutcome::RouteNotFound;
            }
        };

        let handler_name = descriptor.name().to_string();
        let index = descriptor.index().as_str();
        tracing::debug!(
            request_id = exchange.request_id().unwrap_or("unknown"),
            method = %exchange.method(),
            path = %path,
            peer = ?exchange.peer_addr(),
            index = %index,
            handler = %handler_name,
            "Dispatching request"
        );

        // 2. Fresh handler per request; faults stay inside this boundary
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut handler = descriptor.instantiate(&self.context);
            handler.handle(exchange)
        }));

        let fault = match result {
            Ok(Ok(())) if exchange.is_responded() || exchange.is_closed() => None,
            Ok(Ok(())) => Some("handler returned without responding".to_string()),
            Ok(Err(e)) => Some(e.to_string()),
            Err(payload) => Some(panic_message(payload.as_ref())),
        };

        let outcome = match fault {
            None => DispatchOutcome::Handled {
                handler: handler_name,
            },
            Some(error) => {
                tracing::error!(
                    request_id = exchange.request_id().unwrap_or("unknown"),
                    path = %path,
                    handler = %handler_name,
                    error = %error,
                    "Handler fault"
                );
                metrics::record_fault(index);
                answer(exchange, StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_BODY);
                DispatchOutcome::Fault {
                    handler: handler_name,
                }
            }
        };

        metrics::record_dispatch(index, status_of(exchange), start);
        outcome
    }
}

/// Write a dispatcher-level response unless the exchange is already
/// answered or closed.
fn answer(exchange: &mut Exchange, status: StatusCode, body: &str) {
    if exchange.is_responded() || exchange.is_closed() {
        return;
    }
    if let Err(e) = exchange.respond(status.as_u16(), body) {
        tracing::debug!(error = %e, "Dispatcher response dropped");
    }
}

fn status_of(exchange: &Exchange) -> u16 {
    // 499: client closed request before an answer was written
    exchange.reply().map(|r| r.status.as_u16()).unwrap_or(499)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic".to_string()
    }
}
