//! Framework control plane.
//!
//! # Data Flow
//! ```text
//! lifecycle::startup
//!     → FrameworkControlPlane (trait)
//!         → artisan.rs: `php artisan <subcommand>` in the app root
//!         → mock.rs: in-memory recorder for tests
//! ```
//!
//! # Design Decisions
//! - The sequencer never builds command lines itself; it asks for capabilities
//! - Every operation reports success or a typed failure; the caller decides tolerance
//! - Cache lists live here so clear/build order is the same everywhere

pub mod artisan;
pub mod mock;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub use artisan::ArtisanControlPlane;
pub use mock::{FrameworkCall, MockControlPlane};

/// A framework-managed cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkCache {
    Config,
    Route,
    View,
    Application,
}

impl FrameworkCache {
    /// Caches cleared in development-like modes, in order.
    pub const CLEARABLE: [FrameworkCache; 4] = [
        FrameworkCache::Config,
        FrameworkCache::Route,
        FrameworkCache::View,
        FrameworkCache::Application,
    ];

    /// Caches built in production-like modes, in order.
    pub const BUILDABLE: [FrameworkCache; 3] = [
        FrameworkCache::Config,
        FrameworkCache::Route,
        FrameworkCache::View,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FrameworkCache::Config => "config",
            FrameworkCache::Route => "route",
            FrameworkCache::View => "view",
            FrameworkCache::Application => "application",
        }
    }

    /// Console subcommand that clears this cache.
    pub fn clear_command(&self) -> &'static str {
        match self {
            FrameworkCache::Config => "config:clear",
            FrameworkCache::Route => "route:clear",
            FrameworkCache::View => "view:clear",
            FrameworkCache::Application => "cache:clear",
        }
    }

    /// Console subcommand that builds this cache, if it can be prebuilt.
    pub fn build_command(&self) -> Option<&'static str> {
        match self {
            FrameworkCache::Config => Some("config:cache"),
            FrameworkCache::Route => Some("route:cache"),
            FrameworkCache::View => Some("view:cache"),
            FrameworkCache::Application => None,
        }
    }
}

impl fmt::Display for FrameworkCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure of a framework operation.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}: {stderr}", status_label(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{command}` did not finish within {after:?}")]
    TimedOut { command: String, after: Duration },

    #[error("`{command}` produced unusable output: {reason}")]
    InvalidOutput { command: String, reason: String },

    #[error("{0} is not supported by this framework")]
    Unsupported(String),
}

fn status_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

impl CommandError {
    /// Non-zero exit status of the underlying command, if it ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::Failed { code: Some(code), .. } if *code != 0 => Some(*code),
            _ => None,
        }
    }
}

/// Capabilities the startup sequencer needs from the web framework.
pub trait FrameworkControlPlane: Sync {
    /// Generate a fresh application key and return it (not persisted).
    fn generate_key(&self) -> impl Future<Output = Result<String, CommandError>> + Send;

    /// Create the public storage symlink.
    fn link_public_storage(&self) -> impl Future<Output = Result<(), CommandError>> + Send;

    fn clear_cache(
        &self,
        cache: FrameworkCache,
    ) -> impl Future<Output = Result<(), CommandError>> + Send;

    fn build_cache(
        &self,
        cache: FrameworkCache,
    ) -> impl Future<Output = Result<(), CommandError>> + Send;

    /// Clear every clearable cache, attempting all of them regardless of failures.
    fn clear_caches(
        &self,
    ) -> impl Future<Output = Vec<(FrameworkCache, Result<(), CommandError>)>> + Send {
        async move {
            let mut results = Vec::with_capacity(FrameworkCache::CLEARABLE.len());
            for cache in FrameworkCache::CLEARABLE {
                results.push((cache, self.clear_cache(cache).await));
            }
            results
        }
    }

    /// Build every buildable cache, stopping at the first failure.
    ///
    /// Returns the caches built, or the cache that failed with its error.
    fn build_caches(
        &self,
    ) -> impl Future<Output = Result<Vec<FrameworkCache>, (FrameworkCache, CommandError)>> + Send
    {
        async move {
            let mut built = Vec::with_capacity(FrameworkCache::BUILDABLE.len());
            for cache in FrameworkCache::BUILDABLE {
                self.build_cache(cache).await.map_err(|e| (cache, e))?;
                built.push(cache);
            }
            Ok(built)
        }
    }
}
