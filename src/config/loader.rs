//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{EntrypointConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(toml::de::Error),
    Env {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "IO error reading {}: {}", path.display(), e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value, reason } => {
                write!(f, "Invalid {}={:?}: {}", var, value, reason)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML configuration file. Missing sections fall back to defaults.
pub fn load_file(path: &Path) -> Result<EntrypointConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Layered configuration builder.
///
/// Precedence, lowest first: defaults, TOML file, environment, explicit overrides.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    app_root: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this TOML file before applying the environment.
    pub fn file(mut self, path: Option<PathBuf>) -> Self {
        self.file = path;
        self
    }

    /// Override the application root after the environment is applied.
    pub fn app_root(mut self, root: Option<String>) -> Self {
        self.app_root = root;
        self
    }

    /// Merge all layers, reading variables through `lookup`, and validate the result.
    pub fn load<F>(self, lookup: F) -> Result<EntrypointConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match &self.file {
            Some(path) => load_file(path)?,
            None => EntrypointConfig::default(),
        };

        apply_env(&mut config, lookup)?;

        if let Some(root) = self.app_root {
            config.app.root = root;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

/// Overlay recognized environment variables onto `config`.
///
/// Empty values are treated as unset, matching `${VAR:-default}` in the shell.
pub fn apply_env<F>(config: &mut EntrypointConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    if let Some(value) = get("APP_ENV") {
        config.app.env = value;
    }
    if let Some(value) = get("DB_HOST") {
        config.dependency.host = value.trim().to_string();
    }
    if let Some(value) = get("DB_PORT") {
        config.dependency.port = parse_number("DB_PORT", &value)?;
    }
    if let Some(value) = get("ENTRYPOINT_APP_ROOT") {
        config.app.root = value;
    }
    if let Some(value) = get("ENTRYPOINT_DB_WAIT_INTERVAL_MS") {
        config.dependency.interval_ms = parse_number("ENTRYPOINT_DB_WAIT_INTERVAL_MS", &value)?;
    }
    if let Some(value) = get("ENTRYPOINT_DB_WAIT_MAX_ATTEMPTS") {
        config.dependency.max_attempts = parse_number("ENTRYPOINT_DB_WAIT_MAX_ATTEMPTS", &value)?;
    }
    if let Some(value) = get("ENTRYPOINT_ARTISAN") {
        config.framework.artisan = value.split_whitespace().map(str::to_string).collect();
    }
    if let Some(value) = get("ENTRYPOINT_OWNER") {
        let (uid, gid) = parse_owner(&value)?;
        config.permissions.owner_uid = Some(uid);
        config.permissions.owner_gid = Some(gid);
    }
    if let Some(value) = get("ENTRYPOINT_LOG") {
        config.logging.level = value;
    }
    if let Some(value) = get("ENTRYPOINT_LOG_FORMAT") {
        config.logging.format = match value.trim().to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            _ => {
                return Err(ConfigError::Env {
                    var: "ENTRYPOINT_LOG_FORMAT",
                    value,
                    reason: "expected \"pretty\" or \"json\"",
                })
            }
        };
    }

    Ok(())
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
        reason: "expected a non-negative integer",
    })
}

fn parse_owner(value: &str) -> Result<(u32, u32), ConfigError> {
    let invalid = || ConfigError::Env {
        var: "ENTRYPOINT_OWNER",
        value: value.to_string(),
        reason: "expected numeric uid:gid",
    };
    let (uid, gid) = value.trim().split_once(':').ok_or_else(invalid)?;
    let uid = uid.parse().map_err(|_| invalid())?;
    let gid = gid.parse().map_err(|_| invalid())?;
    Ok((uid, gid))
}
