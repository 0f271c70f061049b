//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! environment.rs:
//!     EntrypointConfig → Environment (absolute paths, mode, endpoint, policy)
//!
//! startup.rs (in order, any fatal error aborts):
//!     1. wait for dependency
//!     2. materialize environment file
//!     3. ensure application key
//!     4. ensure public storage link
//!     5. clear (development) or build (otherwise) caches
//!     6. normalize permissions
//!
//! handoff.rs:
//!     7. exec the server command
//! ```
//!
//! # Design Decisions
//! - Every step is idempotent; the same sequence runs on every restart
//! - Fail fast: fatal errors exit before handoff, the orchestrator restarts us
//! - Tolerated failures are logged at warn and counted in the report

pub mod environment;
pub mod handoff;
pub mod startup;

pub use environment::Environment;
pub use handoff::ServerCommand;
pub use startup::{
    CacheAction, CacheOutcome, LinkOutcome, StartupError, StartupReport, StartupSequencer,
};
