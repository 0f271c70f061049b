//! Control plane backed by the framework's `artisan` console.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time;

use crate::config::FrameworkConfig;
use crate::framework::{CommandError, FrameworkCache, FrameworkControlPlane};

/// Runs `<artisan...> <subcommand> --no-interaction` inside the application root.
#[derive(Debug, Clone)]
pub struct ArtisanControlPlane {
    /// Program followed by its leading arguments, e.g. `["php", "artisan"]`.
    command: Vec<String>,
    working_dir: PathBuf,
    timeout: Option<Duration>,
}

impl ArtisanControlPlane {
    pub fn new(command: Vec<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            command,
            working_dir: working_dir.into(),
            timeout: None,
        }
    }

    pub fn from_config(config: &FrameworkConfig, working_dir: impl Into<PathBuf>) -> Self {
        let timeout = (config.command_timeout_secs > 0)
            .then(|| Duration::from_secs(config.command_timeout_secs));
        Self::new(config.artisan.clone(), working_dir).with_timeout(timeout)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run a subcommand and return its stdout.
    async fn run(&self, args: &[&str]) -> Result<String, CommandError> {
        let command_line = format!("{} {}", self.command.join(" "), args.join(" "));

        let (program, prefix) = self.command.split_first().ok_or_else(|| CommandError::Spawn {
            command: command_line.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty artisan command"),
        })?;

        let mut cmd = Command::new(program);
        cmd.args(prefix)
            .args(args)
            .arg("--no-interaction")
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::debug!(command = %command_line, "Running framework command");

        let output = match self.timeout {
            Some(after) => time::timeout(after, cmd.output())
                .await
                .map_err(|_| CommandError::TimedOut {
                    command: command_line.clone(),
                    after,
                })?,
            None => cmd.output().await,
        }
        .map_err(|source| CommandError::Spawn {
            command: command_line.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(CommandError::Failed {
                command: command_line,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl FrameworkControlPlane for ArtisanControlPlane {
    async fn generate_key(&self) -> Result<String, CommandError> {
        let stdout = self.run(&["key:generate", "--show", "--no-ansi"]).await?;

        let key = stdout
            .lines()
            .map(str::trim)
            .rev()
            .find(|line| !line.is_empty())
            .unwrap_or_default();

        if key.is_empty() || key.chars().any(char::is_whitespace) {
            return Err(CommandError::InvalidOutput {
                command: "key:generate --show".to_string(),
                reason: format!("expected a single key, got {:?}", stdout.trim()),
            });
        }

        Ok(key.to_string())
    }

    async fn link_public_storage(&self) -> Result<(), CommandError> {
        self.run(&["storage:link"]).await.map(|_| ())
    }

    async fn clear_cache(&self, cache: FrameworkCache) -> Result<(), CommandError> {
        self.run(&[cache.clear_command()]).await.map(|_| ())
    }

    async fn build_cache(&self, cache: FrameworkCache) -> Result<(), CommandError> {
        let subcommand = cache
            .build_command()
            .ok_or_else(|| CommandError::Unsupported(format!("building the {} cache", cache)))?;
        self.run(&[subcommand]).await.map(|_| ())
    }
}
