//! Startup orchestration.
//!
//! # Responsibilities
//! - Wait for the dependency endpoint
//! - Materialize the environment file and application key
//! - Prepare the public storage link and runtime directories
//! - Clear or build framework caches depending on mode
//! - Normalize permissions on writable trees

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::framework::{CommandError, FrameworkCache, FrameworkControlPlane};
use crate::health::{wait_for_dependency, DependencyProbe, DependencyTimeout};
use crate::lifecycle::environment::Environment;
use crate::workspace::{self, env_file};

/// Fatal startup failures. None of them are retried here.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    DependencyTimeout(#[from] DependencyTimeout),

    #[error("environment file {} is missing and APP_ENV is production", .0.display())]
    MissingProductionEnvironmentFile(PathBuf),

    #[error("environment file {} is missing and there is no template at {}", .target.display(), .template.display())]
    MissingEnvironmentTemplate { target: PathBuf, template: PathBuf },

    #[error("{field} is empty in {} and APP_ENV is production", .path.display())]
    MissingProductionSecret { field: String, path: PathBuf },

    #[error("failed to generate the application key: {0}")]
    KeyGenerationFailed(#[source] CommandError),

    #[error("failed to build the {cache} cache: {source}")]
    CacheBuildFailed {
        cache: FrameworkCache,
        #[source]
        source: CommandError,
    },

    #[error("failed {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to execute {program}: {source}")]
    Handoff {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl StartupError {
    /// Process exit status for this failure.
    ///
    /// Framework command failures pass their own status through.
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::KeyGenerationFailed(source)
            | StartupError::CacheBuildFailed { source, .. } => source.exit_code().unwrap_or(1),
            StartupError::Handoff { source, .. } if source.kind() == io::ErrorKind::NotFound => 127,
            StartupError::Handoff { .. } => 126,
            _ => 1,
        }
    }
}

/// State of the public storage link after step 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkOutcome {
    /// Something already existed at the link path.
    #[default]
    Present,
    Created,
    /// Link creation failed and was tolerated.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheAction {
    Cleared,
    Built,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheOutcome {
    pub cache: FrameworkCache,
    pub action: CacheAction,
    pub ok: bool,
}

/// What a completed sequence did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StartupReport {
    pub probe_attempts: u32,
    pub env_file_created: bool,
    pub key_generated: bool,
    pub storage_link: LinkOutcome,
    pub caches: Vec<CacheOutcome>,
    pub permission_failures: usize,
}

/// Runs the startup steps against an [`Environment`].
pub struct StartupSequencer<F, P> {
    env: Environment,
    framework: F,
    probe: P,
}

impl<F, P> StartupSequencer<F, P>
where
    F: FrameworkControlPlane,
    P: DependencyProbe,
{
    pub fn new(env: Environment, framework: F, probe: P) -> Self {
        Self {
            env,
            framework,
            probe,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn framework(&self) -> &F {
        &self.framework
    }

    /// Run steps 1 through 6. On success the caller hands off to the server.
    pub async fn run(&self) -> Result<StartupReport, StartupError> {
        tracing::info!(
            mode = %self.env.mode,
            app_root = %self.env.app_root.display(),
            "Preparing application container"
        );

        let report = StartupReport {
            probe_attempts: self.wait_for_dependency().await?,
            env_file_created: self.ensure_environment_file()?,
            key_generated: self.ensure_app_key().await?,
            storage_link: self.ensure_public_storage_link().await,
            caches: self.prepare_caches().await?,
            permission_failures: self.normalize_permissions(),
        };

        tracing::info!(
            probes = report.probe_attempts,
            env_file_created = report.env_file_created,
            key_generated = report.key_generated,
            storage_link = ?report.storage_link,
            permission_failures = report.permission_failures,
            "Application container ready"
        );
        Ok(report)
    }

    /// Step 1. Returns the number of probes issued.
    pub async fn wait_for_dependency(&self) -> Result<u32, StartupError> {
        let outcome =
            wait_for_dependency(&self.env.dependency, &self.env.retry, &self.probe).await?;
        Ok(outcome.attempts())
    }

    /// Step 2. Returns whether the file was created from the template.
    pub fn ensure_environment_file(&self) -> Result<bool, StartupError> {
        let target = &self.env.env_file;
        if workspace::entry_exists(target) {
            tracing::debug!(path = %target.display(), "Environment file present");
            return Ok(false);
        }

        if self.env.mode.is_production() {
            return Err(StartupError::MissingProductionEnvironmentFile(target.clone()));
        }

        let template = &self.env.env_template;
        if !template.is_file() {
            return Err(StartupError::MissingEnvironmentTemplate {
                target: target.clone(),
                template: template.clone(),
            });
        }

        let bytes = workspace::copy_template(template, target).map_err(|source| StartupError::Io {
            action: "copying the environment template to",
            path: target.clone(),
            source,
        })?;

        tracing::info!(
            path = %target.display(),
            template = %template.display(),
            bytes,
            "Created environment file from template"
        );
        Ok(true)
    }

    /// Step 3. Returns whether a key was generated.
    pub async fn ensure_app_key(&self) -> Result<bool, StartupError> {
        let path = &self.env.env_file;
        let field = &self.env.key_field;

        let existing = env_file::read_key(path, field).map_err(|source| StartupError::Io {
            action: "reading",
            path: path.clone(),
            source,
        })?;
        if existing.is_some() {
            tracing::debug!(field = %field, "Application key present");
            return Ok(false);
        }

        if self.env.mode.is_production() {
            return Err(StartupError::MissingProductionSecret {
                field: field.clone(),
                path: path.clone(),
            });
        }

        let key = self
            .framework
            .generate_key()
            .await
            .map_err(StartupError::KeyGenerationFailed)?;

        env_file::write_key(path, field, &key).map_err(|source| StartupError::Io {
            action: "writing the application key to",
            path: path.clone(),
            source,
        })?;

        tracing::info!(field = %field, path = %path.display(), "Generated application key");
        Ok(true)
    }

    /// Step 4. Best-effort; never fails the sequence.
    pub async fn ensure_public_storage_link(&self) -> LinkOutcome {
        let link = &self.env.public_storage_link;
        if workspace::entry_exists(link) {
            tracing::debug!(path = %link.display(), "Public storage link present");
            return LinkOutcome::Present;
        }

        for (dir, error) in workspace::ensure_dirs(&self.env.runtime_dirs) {
            tracing::warn!(path = %dir.display(), error = %error, "Could not create runtime directory");
        }

        match self.framework.link_public_storage().await {
            Ok(()) => {
                tracing::info!(path = %link.display(), "Linked public storage");
                LinkOutcome::Created
            }
            Err(e) => {
                tracing::warn!(
                    path = %link.display(),
                    error = %e,
                    "Could not link public storage, continuing"
                );
                LinkOutcome::Failed
            }
        }
    }

    /// Step 5. Clearing failures are tolerated; build failures are fatal.
    pub async fn prepare_caches(&self) -> Result<Vec<CacheOutcome>, StartupError> {
        if self.env.mode.is_development_like() {
            let results = self.framework.clear_caches().await;
            let outcomes = results
                .into_iter()
                .map(|(cache, result)| {
                    if let Err(e) = &result {
                        tracing::warn!(cache = %cache, error = %e, "Could not clear cache, continuing");
                    } else {
                        tracing::debug!(cache = %cache, "Cleared cache");
                    }
                    CacheOutcome {
                        cache,
                        action: CacheAction::Cleared,
                        ok: result.is_ok(),
                    }
                })
                .collect();
            return Ok(outcomes);
        }

        let built = self
            .framework
            .build_caches()
            .await
            .map_err(|(cache, source)| StartupError::CacheBuildFailed { cache, source })?;

        tracing::info!(caches = ?built, "Built framework caches");
        Ok(built
            .into_iter()
            .map(|cache| CacheOutcome {
                cache,
                action: CacheAction::Built,
                ok: true,
            })
            .collect())
    }

    /// Step 6. Returns the number of entries that could not be updated.
    pub fn normalize_permissions(&self) -> usize {
        let mut failures = 0;
        for tree in &self.env.permission_trees {
            let report = workspace::normalize_tree(tree, &self.env.permissions);
            if let Some((path, error)) = report.failures.first() {
                tracing::warn!(
                    tree = %tree.display(),
                    failures = report.failures.len(),
                    first_path = %path.display(),
                    error = %error,
                    "Could not normalize all permissions, continuing"
                );
            } else {
                tracing::debug!(tree = %tree.display(), entries = report.entries, "Normalized permissions");
            }
            failures += report.failures.len();
        }
        failures
    }
}
