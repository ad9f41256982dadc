use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stayscan::app::AppContext;
use stayscan::cli::{commands, Cli, Commands};
use stayscan::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log.as_deref())?;

    match cli.command {
        Commands::Collect { ref request, headed } => {
            let ctx = match open_context(cli.config.as_deref(), cli.db.clone()) {
                Ok(ctx) => ctx,
                Err(e) => {
                    error!("Cannot start collection: {:#}", e);
                    return Ok(());
                }
            };
            commands::collect(&ctx, request, headed)
                .await
                .context("Browser session could not be started")?;
        }
        Commands::List { date } => {
            let ctx = open_context(cli.config.as_deref(), cli.db.clone())?;
            commands::list_listings(&ctx, date)?;
        }
    }

    Ok(())
}

fn open_context(config_path: Option<&Path>, db: Option<PathBuf>) -> anyhow::Result<AppContext> {
    let config = match config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(AppContext::new(config, db)?)
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(file_layer)
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stayscan=info")))
        .init();

    Ok(())
}
