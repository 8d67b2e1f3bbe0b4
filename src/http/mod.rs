//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (add request ID)
//!     → buffer body, build Exchange
//!     → Dispatcher (on the blocking pool)
//!     → Reply → axum Response
//! ```

pub mod request;
pub mod server;

pub use request::{MakeRequestUuid, RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
