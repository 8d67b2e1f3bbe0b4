//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build registry → Build server → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then registry, then listeners
//! - Ordered shutdown: stop accept, drain, close

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
