//! Vigil - Upstream Cache Synchronizer
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vigil::cli::{Cli, Commands};
use vigil::config::ConfigManager;
use vigil::error::VigilResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            // A failed collaborator's own exit status is passed through
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> VigilResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn (spinners only), 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("vigil=warn"),
        1 => EnvFilter::new("vigil=info"),
        _ => EnvFilter::new("vigil=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    let config = config_manager.load().await?;

    // Ensure state directories exist
    ConfigManager::ensure_state_dirs().await?;

    // Dispatch to command
    match cli.command {
        Commands::Run(args) => vigil::cli::commands::run(args, &config).await,
        Commands::Status => vigil::cli::commands::status(&config).await,
        Commands::Config(args) => {
            vigil::cli::commands::config(args, &config_manager, &config).await
        }
    }
}
