//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): dispatched requests by index, status
//! - `dispatch_duration_seconds` (histogram): time spent in the dispatcher
//! - `dispatch_faults_total` (counter): handler faults by index
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests need none)
//! - Label values come from the registry, never from request paths
//! - Prometheus exporter is optional and owns its own listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Label value for requests whose path matched no route index.
pub const UNMATCHED_INDEX: &str = "unmatched";

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed dispatch.
pub fn record_dispatch(index: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "dispatch_requests_total",
        "index" => index.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("dispatch_duration_seconds", "index" => index.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_fault(index: &str) {
    ::metrics::counter!("dispatch_faults_total", "index" => index.to_string()).increment(1);
}
