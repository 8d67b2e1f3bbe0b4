//! In-flight request/response pair handed to handlers.
//!
//! # Responsibilities
//! - Expose the request head (method, path, headers) and buffered body
//! - Accept exactly one response write
//! - Observe transport-side closure
//!
//! # Design Decisions
//! - The response slot is write-once; a second write is an error, not an overwrite
//! - Closure is signalled through a shared flag so the transport can close
//!   the exchange while a handler still holds it

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, Uri};

/// Errors raised when writing to an exchange.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("exchange already has a response")]
    AlreadyResponded,
    #[error("exchange was closed by the transport")]
    Closed,
    #[error("invalid status code {0}")]
    InvalidStatus(u16),
}

/// The single response written to an exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

/// Handle used by the transport to close an exchange from outside.
#[derive(Debug, Clone, Default)]
pub struct CloseHandle {
    closed: Arc<AtomicBool>,
}

impl CloseHandle {
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// One HTTP request/response pair.
#[derive(Debug)]
pub struct Exchange {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    peer_addr: Option<SocketAddr>,
    reply: Option<Reply>,
    close: CloseHandle,
}

impl Exchange {
    /// Create an exchange with no headers and an empty body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            peer_addr: None,
            reply: None,
            close: CloseHandle::default(),
        }
    }

    /// Convenience constructor for a `GET` to `path`.
    ///
    /// Falls back to `/` if `path` is not a valid URI.
    pub fn get(path: &str) -> Self {
        let uri = path.parse().unwrap_or_else(|_| Uri::from_static("/"));
        Self::new(Method::GET, uri)
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// The `x-request-id` header, if the transport assigned one.
    pub fn request_id(&self) -> Option<&str> {
        self.headers
            .get(crate::http::X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
    }

    /// Write the response. Succeeds at most once per exchange.
    pub fn respond(&mut self, status: u16, body: impl Into<String>) -> Result<(), ExchangeError> {
        if self.close.is_closed() {
            return Err(ExchangeError::Closed);
        }
        if self.reply.is_some() {
            return Err(ExchangeError::AlreadyResponded);
        }
        let status = StatusCode::from_u16(status).map_err(|_| ExchangeError::InvalidStatus(status))?;
        self.reply = Some(Reply {
            status,
            body: body.into(),
        });
        Ok(())
    }

    pub fn is_responded(&self) -> bool {
        self.reply.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.close.is_closed()
    }

    /// A handle the transport keeps to close this exchange.
    pub fn close_handle(&self) -> CloseHandle {
        self.close.clone()
    }

    pub fn reply(&self) -> Option<&Reply> {
        self.reply.as_ref()
    }

    pub fn into_reply(self) -> Option<Reply> {
        self.reply
    }
}
