//! Request ID assignment.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID for requests that arrive without one
//! - Copy the ID onto the response
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A client-supplied `x-request-id` is kept as-is

use axum::http::{HeaderName, Request};
use tower::Layer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestId, PropagateRequestIdLayer, RequestId, SetRequestId, SetRequestIdLayer,
};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        id.parse().ok().map(RequestId::new)
    }
}

/// Layer that sets `x-request-id` on requests and propagates it to responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = SetRequestId<PropagateRequestId<S>, MakeRequestUuid>;

    fn layer(&self, inner: S) -> Self::Service {
        let header = HeaderName::from_static(X_REQUEST_ID);
        let propagate = PropagateRequestIdLayer::new(header.clone()).layer(inner);
        SetRequestIdLayer::new(header, MakeRequestUuid).layer(propagate)
    }
}
