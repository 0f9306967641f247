//! Kiln - asset build orchestrator
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use kiln::cli::{Cli, Commands};
use kiln::config::{ConfigManager, LOCAL_CONFIG_FILE};
use kiln::error::{KilnError, KilnResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> KilnResult<()> {
    let cli = Cli::parse();

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("kiln=warn"),
        1 => EnvFilter::new("kiln=info"),
        _ => EnvFilter::new("kiln=debug"),
    };

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }

    kiln::ui::init_theme();

    let project_root = resolve_project_root(cli.project.as_deref())?;
    debug!("Project root: {}", project_root.display());

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::for_project(&project_root),
    };
    let config = config_manager.load().await?;
    debug!("Loaded config from {}", config_manager.path().display());

    match cli.command {
        Commands::Build(args) => kiln::cli::commands::build(args, &config, &project_root).await,
        Commands::Watch(args) => kiln::cli::commands::watch(args, &config, &project_root).await,
        Commands::Config(args) => {
            let init_target = match cli.config {
                Some(ref path) => ConfigManager::with_path(path.clone()),
                None => ConfigManager::with_path(project_root.join(LOCAL_CONFIG_FILE)),
            };
            kiln::cli::commands::config(args, &config, &config_manager, &init_target).await
        }
        Commands::Cache(args) => kiln::cli::commands::cache(args, &config, &project_root).await,
    }
}

/// Canonical project root so watcher paths strip cleanly
fn resolve_project_root(project: Option<&std::path::Path>) -> KilnResult<std::path::PathBuf> {
    let root = match project {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()
            .map_err(|e| KilnError::io("getting current directory", e))?,
    };
    root.canonicalize()
        .map_err(|_| KilnError::ProjectNotFound(root.clone()))
}
