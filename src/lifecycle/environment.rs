//! Resolved startup environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::validation::{parse_mode_bits, ValidationError};
use crate::config::{AppMode, ConfigError, EntrypointConfig};
use crate::health::Endpoint;
use crate::resilience::RetryPolicy;
use crate::workspace::PermissionSpec;

/// Everything the sequencer needs, with every path made absolute.
///
/// Steps read only from this value; nothing is looked up from the process
/// environment or the current directory once it is built.
#[derive(Debug, Clone)]
pub struct Environment {
    pub mode: AppMode,
    pub app_root: PathBuf,
    pub env_file: PathBuf,
    pub env_template: PathBuf,
    pub key_field: String,
    pub public_storage_link: PathBuf,
    pub runtime_dirs: Vec<PathBuf>,
    pub dependency: Endpoint,
    pub retry: RetryPolicy,
    pub connect_timeout: Duration,
    pub permission_trees: Vec<PathBuf>,
    pub permissions: PermissionSpec,
}

impl Environment {
    pub fn from_config(config: &EntrypointConfig) -> Result<Self, ConfigError> {
        let root = PathBuf::from(&config.app.root);
        let at_root = |relative: &String| resolve(&root, relative);

        let mode = parse_mode_bits(&config.permissions.mode).ok_or_else(|| {
            ConfigError::Validation(vec![ValidationError::InvalidMode(
                config.permissions.mode.clone(),
            )])
        })?;

        Ok(Self {
            mode: AppMode::parse(&config.app.env),
            env_file: at_root(&config.app.env_file),
            env_template: at_root(&config.app.env_template),
            key_field: config.app.key_field.clone(),
            public_storage_link: at_root(&config.app.public_storage_link),
            runtime_dirs: config.app.runtime_dirs.iter().map(at_root).collect(),
            dependency: Endpoint::new(config.dependency.host.clone(), config.dependency.port),
            retry: RetryPolicy::from_config(&config.dependency),
            connect_timeout: Duration::from_millis(config.dependency.connect_timeout_ms),
            permission_trees: config.permissions.paths.iter().map(at_root).collect(),
            permissions: PermissionSpec {
                mode,
                owner_uid: config.permissions.owner_uid,
                owner_gid: config.permissions.owner_gid,
            },
            app_root: root,
        })
    }

    /// Stock layout under `root` in the given mode.
    pub fn with_defaults(root: &Path, mode: &str) -> Result<Self, ConfigError> {
        let mut config = EntrypointConfig::default();
        config.app.root = root.display().to_string();
        config.app.env = mode.to_string();
        Self::from_config(&config)
    }
}

fn resolve(root: &Path, path: &str) -> PathBuf {
    root.join(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_resolve_against_root() {
        let env = Environment::with_defaults(Path::new("/srv/app"), "local").unwrap();
        assert_eq!(env.mode, AppMode::Local);
        assert_eq!(env.env_file, PathBuf::from("/srv/app/.env"));
        assert_eq!(env.env_template, PathBuf::from("/srv/app/.env.example"));
        assert_eq!(env.public_storage_link, PathBuf::from("/srv/app/public/storage"));
        assert_eq!(
            env.permission_trees,
            vec![PathBuf::from("/srv/app/storage"), PathBuf::from("/srv/app/bootstrap/cache")]
        );
        assert_eq!(env.permissions.mode, 0o775);
        assert_eq!(env.retry, RetryPolicy::default());
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        let mut config = EntrypointConfig::default();
        config.app.env_file = "/run/secrets/app.env".into();
        let env = Environment::from_config(&config).unwrap();
        assert_eq!(env.env_file, PathBuf::from("/run/secrets/app.env"));
    }
}
