//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the entrypoint.
//! All types derive Serde traits for deserialization from config files, and
//! every section defaults so that running without a config file is the norm.

use serde::{Deserialize, Serialize};

/// Root configuration for the startup sequencer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EntrypointConfig {
    /// Application layout and deployment mode.
    pub app: AppConfig,

    /// Backing service that must accept connections before startup continues.
    pub dependency: DependencyConfig,

    /// Framework console invocation.
    pub framework: FrameworkConfig,

    /// Ownership and mode normalization.
    pub permissions: PermissionsConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Application layout.
///
/// Relative paths are resolved against `root`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment mode as found in `APP_ENV`.
    pub env: String,

    /// Application root directory.
    pub root: String,

    /// Environment file read by the application.
    pub env_file: String,

    /// Template copied to `env_file` outside production.
    pub env_template: String,

    /// Environment-file field holding the application secret.
    pub key_field: String,

    /// Public symlink into the storage tree.
    pub public_storage_link: String,

    /// Directories the framework expects to be able to write to.
    pub runtime_dirs: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: "production".to_string(),
            root: "/var/www/html".to_string(),
            env_file: ".env".to_string(),
            env_template: ".env.example".to_string(),
            key_field: "APP_KEY".to_string(),
            public_storage_link: "public/storage".to_string(),
            runtime_dirs: vec![
                "storage/framework/sessions".to_string(),
                "storage/framework/views".to_string(),
                "storage/framework/cache".to_string(),
                "storage/logs".to_string(),
                "storage/app/public".to_string(),
            ],
        }
    }
}

/// Dependency wait configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DependencyConfig {
    /// Dependency host (e.g., "db"). Loopback hosts skip the wait entirely.
    pub host: String,

    /// Dependency TCP port.
    pub port: u16,

    /// Delay between probes in milliseconds.
    pub interval_ms: u64,

    /// Maximum number of probes (0 = wait forever).
    pub max_attempts: u32,

    /// Per-probe connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Delay strategy between probes.
    pub backoff: BackoffKind,

    /// Upper bound for exponential delays in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            interval_ms: 1000,
            max_attempts: 0,
            connect_timeout_ms: 1000,
            backoff: BackoffKind::Fixed,
            max_delay_ms: 10_000,
        }
    }
}

/// Delay strategy between dependency probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Same delay between every probe.
    #[default]
    Fixed,
    /// Doubling delay with jitter, capped at `max_delay_ms`.
    Exponential,
}

/// Framework console configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Console command prefix, e.g. `["php", "artisan"]`.
    pub artisan: Vec<String>,

    /// Per-command timeout in seconds (0 = none).
    pub command_timeout_secs: u64,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            artisan: vec!["php".to_string(), "artisan".to_string()],
            command_timeout_secs: 0,
        }
    }
}

/// Permission normalization configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PermissionsConfig {
    /// Directory trees normalized on every start.
    pub paths: Vec<String>,

    /// Octal mode applied to every entry (e.g., "775").
    pub mode: String,

    /// Owner uid; ownership is left alone when unset.
    pub owner_uid: Option<u32>,

    /// Owner gid; ownership is left alone when unset.
    pub owner_gid: Option<u32>,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            paths: vec!["storage".to_string(), "bootstrap/cache".to_string()],
            mode: "775".to_string(),
            owner_uid: None,
            owner_gid: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error).
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_container() {
        let config = EntrypointConfig::default();
        assert_eq!(config.app.env, "production");
        assert_eq!(config.app.env_file, ".env");
        assert_eq!(config.dependency.port, 3306);
        assert_eq!(config.dependency.interval_ms, 1000);
        assert_eq!(config.dependency.max_attempts, 0);
        assert_eq!(config.permissions.paths, vec!["storage", "bootstrap/cache"]);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EntrypointConfig = toml::from_str(
            r#"
            [dependency]
            host = "db"
            backoff = "exponential"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.dependency.host, "db");
        assert_eq!(config.dependency.port, 3306);
        assert_eq!(config.dependency.backoff, BackoffKind::Exponential);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.app.key_field, "APP_KEY");
    }
}
