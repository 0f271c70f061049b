//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every startup step emits:
//!     → logging.rs (structured log events on stderr)
//!
//! Consumers:
//!     → container runtime log driver (docker logs, kubectl logs)
//! ```
//!
//! # Design Decisions
//! - Logs go to stderr so the server's stdout is never interleaved with ours
//! - JSON format for log pipelines, pretty format for humans
//! - Fields carry step context (host, path, cache) instead of formatted text

pub mod logging;

pub use logging::init_logging;
