//! Startup orchestration.
//!
//! # Responsibilities
//! - Apply configuration overrides to the registration list
//! - Build the handler registry (fatal on illegal metadata)
//!
//! # Design Decisions
//! - Fail fast: any registration error aborts startup
//! - Registry is complete before the listener accepts traffic

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::dispatch::{apply_overrides, Registration, RegistrationError, Registry};

/// Build the immutable registry from compiled-in registrations and config.
pub fn build_registry(
    registrations: Vec<Registration>,
    config: &ServerConfig,
) -> Result<Arc<Registry>, RegistrationError> {
    let candidates = apply_overrides(registrations, &config.registrations)?;
    let registry = Registry::build(candidates)?;

    if registry.is_empty() {
        tracing::warn!("No handlers registered; every request will receive 404");
    }
    Ok(Arc::new(registry))
}
