//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router feeding every request to the dispatcher
//! - Wire up middleware (tracing, timeout, request ID)
//! - Turn requests into exchanges and replies into responses
//! - Bind server to listener with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::dispatch::dispatcher::SERVER_ERROR_BODY;
use crate::dispatch::{CloseHandle, Dispatcher, Exchange, HandlerContext, Registry};
use crate::http::request::RequestIdLayer;
use crate::security::AccessPolicy;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_bytes: usize,
}

/// HTTP front end for the dispatcher.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around an already-built dispatcher.
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            max_body_bytes: config.access.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Create a server whose handlers share the access policy from `config`.
    pub fn with_registry(config: ServerConfig, registry: Arc<Registry>) -> Self {
        let policy = Arc::new(AccessPolicy::from_config(&config.access));
        let dispatcher = Dispatcher::new(registry, HandlerContext::new(policy));
        Self::new(config, dispatcher)
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// The fully layered router (useful for in-process testing).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Closes the exchange if the request future is dropped mid-dispatch
/// (client disconnect or timeout).
struct CloseOnDrop(Option<CloseHandle>);

impl CloseOnDrop {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            handle.close();
        }
    }
}

/// Catch-all handler: buffers the request and runs the dispatcher on the
/// blocking pool.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    // One byte over the limit so the access policy rejects oversize bodies itself
    let limit = state.max_body_bytes.saturating_add(1);
    let body = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) if is_length_limit(&e) => {
            tracing::warn!(path = %parts.uri.path(), limit = state.max_body_bytes, "Request body too large");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
        Err(e) => {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Failed to read request body");
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    let peer_addr = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let mut exchange = Exchange::new(parts.method, parts.uri)
        .with_headers(parts.headers)
        .with_body(body);
    if let Some(addr) = peer_addr {
        exchange = exchange.with_peer_addr(addr);
    }

    let guard = CloseOnDrop(Some(exchange.close_handle()));
    let dispatcher = state.dispatcher.clone();
    let joined = tokio::task::spawn_blocking(move || {
        dispatcher.dispatch(&mut exchange);
        exchange
    })
    .await;
    guard.disarm();

    match joined {
        Ok(exchange) => match exchange.into_reply() {
            Some(reply) => (reply.status, reply.body).into_response(),
            None => (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_BODY).into_response(),
        },
        Err(e) => {
            tracing::error!(error = %e, "Dispatch task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_BODY).into_response()
        }
    }
}

/// Whether a body read failed because the size limit was hit, as opposed
/// to the client stream breaking.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
