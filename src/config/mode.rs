//! Deployment mode.

use std::fmt;

/// Deployment mode parsed from `APP_ENV`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMode {
    Production,
    Local,
    Development,
    /// Any other value (e.g. "staging"); treated as production-like for caches.
    Other(String),
}

impl AppMode {
    /// Parse a mode string. Matching is case-insensitive and ignores surrounding whitespace.
    pub fn parse(value: &str) -> Self {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "production" => Self::Production,
            "local" => Self::Local,
            "development" => Self::Development,
            _ => Self::Other(normalized),
        }
    }

    /// Whether missing secrets and environment files are fatal.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Whether caches are cleared rather than built.
    pub fn is_development_like(&self) -> bool {
        matches!(self, Self::Local | Self::Development)
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Local => write!(f, "local"),
            Self::Development => write!(f, "development"),
            Self::Other(value) => write!(f, "{}", value),
        }
    }
}
