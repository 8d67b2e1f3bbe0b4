//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → consumed once at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once; the registry it shapes never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AccessConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::RegistrationOverride;
pub use schema::ServerConfig;
pub use schema::TimeoutConfig;
