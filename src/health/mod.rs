//! Dependency readiness subsystem.
//!
//! # Data Flow
//! ```text
//! dependency.rs:
//!     Endpoint loopback? → skip, zero probes
//!     otherwise → probe.rs (TCP connect with timeout)
//!               → failure: resilience::RetryPolicy decides sleep or give up
//!               → success: continue startup
//! ```
//!
//! # Design Decisions
//! - A successful TCP handshake is the readiness signal; no protocol handshake
//! - Probes go through a trait so the wait loop is testable without sockets
//! - Loopback means the dependency lives in this container and is started by us later

pub mod dependency;
pub mod probe;

pub use dependency::{wait_for_dependency, DependencyTimeout, WaitOutcome};
pub use probe::{DependencyProbe, Endpoint, TcpProbe};
