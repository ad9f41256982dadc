pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stayscan")]
#[command(about = "Collects short-term rental listings for a map region", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/stayscan/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides the configured path)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(short, long, global = true)]
    pub log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect every listing inside a region
    Collect {
        /// JSON object with `sido`, `ne_lat`, `ne_lng`, `sw_lat`, `sw_lng`
        /// and optionally `country`
        #[arg(short, long)]
        request: String,

        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },
    /// List listings collected on a day
    List {
        /// Collection date as YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<chrono::NaiveDate>,
    },
}
