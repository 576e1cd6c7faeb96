//! TileVault CLI - Command-line interface
//!
//! Saves map tiles for offline use and shows how tiles resolve against the
//! local store.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use commands::plan::PlanArgs;
use commands::remove::RemoveArgs;
use commands::resolve::ResolveArgs;
use commands::save::SaveArgs;
use error::CliError;
use runner::GlobalOptions;

#[derive(Parser)]
#[command(name = "tilevault")]
#[command(version, about = "Save map tiles for offline use", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.tilevault/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Display pixel ratio; above 1.0 enables retina tiles when configured
    #[arg(long, global = true, default_value_t = 1.0)]
    device_pixel_ratio: f64,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tiles a save of the viewport would download
    Plan(PlanArgs),

    /// Download every tile covering the viewport
    Save(SaveArgs),

    /// Show whether a tile is served locally or from the network
    Resolve(ResolveArgs),

    /// Remove every saved tile
    Remove(RemoveArgs),

    /// Inspect the tile store
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let options = GlobalOptions {
        config_path: cli.config,
        device_pixel_ratio: cli.device_pixel_ratio,
        verbose: cli.verbose,
    };

    if let Err(e) = dispatch(cli.command, options).await {
        e.exit();
    }
}

async fn dispatch(command: Commands, options: GlobalOptions) -> Result<(), CliError> {
    match command {
        Commands::Plan(args) => commands::plan::run(args, options).await,
        Commands::Save(args) => commands::save::run(args, options).await,
        Commands::Resolve(args) => commands::resolve::run(args, options).await,
        Commands::Remove(args) => commands::remove::run(args, options).await,
        Commands::Cache { action } => commands::cache::run(action, options).await,
        Commands::Config { command } => commands::config::run(command, &options),
    }
}
