//! Built-in request handlers and the startup registration list.

pub mod basic;

use crate::dispatch::Registration;

pub use basic::BasicFunctionality;

/// Every handler compiled into the server, in registration order.
///
/// Registration order breaks priority ties within a route index.
pub fn registrations() -> Vec<Registration> {
    vec![Registration::of::<BasicFunctionality>()]
}
