//! Priority-ordered HTTP handler dispatch.
//!
//! Handlers declare the route index they serve and a priority. At startup
//! the registry groups them by index and orders each group; at runtime the
//! dispatcher hands every request to the highest-ranked handler of its
//! index, containing any fault at the dispatch boundary.

pub mod config;
pub mod dispatch;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ServerConfig;
pub use dispatch::{Dispatcher, Registry};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
