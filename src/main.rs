//! Container entrypoint for the PHP application image.
//!
//! # Startup Overview
//!
//! ```text
//!   docker run image php-fpm
//!        │
//!        ▼
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                        ENTRYPOINT                             │
//!   │                                                               │
//!   │  config ──▶ Environment ──▶ StartupSequencer                  │
//!   │                               │                               │
//!   │     1. wait for DB_HOST:DB_PORT      (health + resilience)    │
//!   │     2. .env from .env.example        (workspace)              │
//!   │     3. APP_KEY                       (framework + workspace)  │
//!   │     4. public/storage link           (framework)              │
//!   │     5. clear or build caches         (framework)              │
//!   │     6. chmod/chown storage trees     (workspace)              │
//!   │                               │                               │
//!   └───────────────────────────────┼───────────────────────────────┘
//!                                   ▼
//!                        7. exec php-fpm (same PID)
//! ```
//!
//! Any fatal step exits non-zero before step 7; the orchestrator restarts
//! the container and the whole sequence runs again.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use container_entrypoint::config::{ConfigLoader, LoggingConfig};
use container_entrypoint::framework::ArtisanControlPlane;
use container_entrypoint::health::TcpProbe;
use container_entrypoint::lifecycle::{Environment, ServerCommand, StartupError, StartupSequencer};
use container_entrypoint::observability::init_logging;

/// sysexits.h EX_CONFIG
const EX_CONFIG: u8 = 78;

#[derive(Parser)]
#[command(name = "entrypoint", version)]
#[command(about = "Prepare the application container, then exec the server command", long_about = None)]
struct Cli {
    /// Optional TOML configuration file.
    #[arg(long, env = "ENTRYPOINT_CONFIG")]
    config: Option<PathBuf>,

    /// Application root (takes precedence over ENTRYPOINT_APP_ROOT).
    #[arg(long)]
    app_root: Option<String>,

    /// Print the resolved configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,

    /// Server command and its arguments, e.g. `php-fpm -F`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ConfigLoader::new()
        .file(cli.config.clone())
        .app_root(cli.app_root.clone())
        .load(|var| std::env::var(var).ok())
    {
        Ok(config) => config,
        Err(e) => {
            let _ = init_logging(&LoggingConfig::default());
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(EX_CONFIG);
        }
    };

    if cli.print_config {
        return match serde_json::to_string_pretty(&config) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("entrypoint: failed to render configuration: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("entrypoint: failed to initialize logging: {}", e);
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "entrypoint starting");

    let env = match Environment::from_config(&config) {
        Ok(env) => env,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::from(EX_CONFIG);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let framework = ArtisanControlPlane::from_config(&config.framework, env.app_root.clone());
    let probe = TcpProbe::new(env.connect_timeout);
    let sequencer = StartupSequencer::new(env, framework, probe);

    let result = runtime.block_on(sequencer.run());
    // No runtime threads or timers may outlive the exec below.
    drop(runtime);

    if let Err(e) = result {
        return fail(e);
    }

    match ServerCommand::from_args(cli.command) {
        Some(command) => fail(command.exec()),
        None => {
            tracing::info!("No server command supplied, nothing to hand off");
            ExitCode::SUCCESS
        }
    }
}

fn fail(error: StartupError) -> ExitCode {
    tracing::error!(error = %error, "Startup failed");
    ExitCode::from(u8::try_from(error.exit_code()).unwrap_or(1))
}
