//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → loader.rs (optional TOML file)
//!     → loader.rs (APP_ENV, DB_HOST, DB_PORT, ENTRYPOINT_* overlay)
//!     → CLI overrides
//!     → validation.rs (semantic checks)
//!     → EntrypointConfig (validated, immutable)
//!     → lifecycle::Environment (resolved paths)
//! ```
//!
//! # Design Decisions
//! - Config is read once per container start; there is no reload
//! - All fields have defaults so the stock image needs no config file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod mode;
pub mod schema;
pub mod validation;

pub use loader::{ConfigError, ConfigLoader};
pub use mode::AppMode;
pub use schema::{
    AppConfig, BackoffKind, DependencyConfig, EntrypointConfig, FrameworkConfig, LogFormat,
    LoggingConfig, PermissionsConfig,
};
