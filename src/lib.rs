//! Container startup sequencer library.

pub mod config;
pub mod framework;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod workspace;

pub use config::schema::EntrypointConfig;
pub use lifecycle::{Environment, ServerCommand, StartupError, StartupSequencer};
