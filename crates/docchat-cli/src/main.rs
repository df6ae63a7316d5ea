use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use docchat_application::SessionStore;
use docchat_infrastructure::{ConfigService, DocchatPaths, HttpSessionBackend};

mod commands;
mod logging;
mod render;
mod repl;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "docchat - chat with your documents", long_about = None)]
struct Cli {
    /// Backend base URL (overrides the config file and DOCCHAT_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for config and logs instead of the platform config directory
    #[arg(long)]
    root: Option<PathBuf>,

    /// Also write logs to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is reachable
    Check,
    /// Print the backend's sessions and exit
    Sessions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = DocchatPaths::new(cli.root.clone());
    let config_service = match &cli.config {
        Some(path) => ConfigService::new(path),
        None => ConfigService::from_paths(&paths)?,
    };
    let mut config = config_service.get_config()?;
    if let Some(base_url) = cli.base_url {
        config.backend.base_url = base_url;
    }

    let _guard = logging::init(&paths, &config.logging.level, cli.verbose)?;
    tracing::info!(
        "[main] Starting docchat against {} (config {})",
        config.backend.base_url,
        config_service.path().display()
    );

    let backend = Arc::new(HttpSessionBackend::new(config.backend.base_url.clone()));

    match cli.command {
        Some(Commands::Check) => {
            let message = backend.health().await?;
            println!(
                "{}",
                format!("{} is up: {}", backend.base_url(), message).bright_green()
            );
        }
        Some(Commands::Sessions) => {
            let store = SessionStore::new(backend, config.codec.codec());
            store.refresh().await?;
            render::sessions(&store);
        }
        None => {
            let store = Arc::new(SessionStore::new(backend, config.codec.codec()));
            store.initialize().await;
            repl::run(store).await?;
        }
    }

    Ok(())
}
