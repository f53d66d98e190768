//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, CINDER_SECRET override)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → owned by the built App, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, ApplicationConfig, CookieConfig, ObservabilityConfig, ServerConfig, SessionBackend,
    SessionConfig,
};
pub use validation::{validate_config, ValidationError};
