//! Handler registration and dispatch.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     handlers::registrations()  (explicit list)
//!     → registry::apply_overrides (config adjustments)
//!     → Registry::build (validate, group by index, order by priority)
//!     → Arc<Registry>, immutable
//!
//! Per request:
//!     Exchange
//!     → Dispatcher::dispatch (index from path, registry lookup)
//!     → fresh Handler instance → handle(exchange)
//!     → exactly one response write
//! ```
//!
//! # Design Decisions
//! - Registry is read-only after startup; concurrent reads need no locks
//! - First match wins within an index group
//! - Handler faults never escape the dispatcher

pub mod dispatcher;
pub mod exchange;
pub mod handler;
pub mod metadata;
pub mod priority;
pub mod registry;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use exchange::{CloseHandle, Exchange, ExchangeError, Reply};
pub use handler::{AccessHandler, Admission, Handler, HandlerContext, HandlerError};
pub use metadata::{HandlerFactory, Registration, RouteHandler, RouteIndex};
pub use priority::Priority;
pub use registry::{apply_overrides, HandlerDescriptor, RegistrationError, Registry};
