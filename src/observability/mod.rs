//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, registry, server produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through dispatch log lines

pub mod logging;
pub mod metrics;
