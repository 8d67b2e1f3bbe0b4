//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Handler::handle
//!     → AccessHandler::set_http_exchange
//!     → access_control.rs (method, bearer token, body size)
//!     → Continue, or rejection written and AlreadyHandled
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any failed check
//! - One policy for all handlers, built once at startup

pub mod access_control;

pub use access_control::{AccessPolicy, Rejection};
