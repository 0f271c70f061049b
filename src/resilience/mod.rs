//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Dependency probe fails:
//!     → retries.rs (is another attempt allowed?)
//!     → backoff.rs (how long to sleep before it)
//!     → health::dependency retries or gives up with DependencyTimeout
//! ```
//!
//! # Design Decisions
//! - Default policy is the historical one: fixed 1s interval, no cap
//! - A cap turns an endless wait into a distinct, reportable failure
//! - Jittered exponential backoff is opt-in

pub mod backoff;
pub mod retries;

pub use retries::RetryPolicy;
