//! Cache management CLI commands.

use clap::Subcommand;
use tilevault::app::StorageConfig;
use tilevault::config::format_size;

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show saved tile statistics
    Stats,
}

/// Run a cache subcommand.
pub async fn run(action: CacheAction, options: GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;

    match action {
        CacheAction::Stats => {
            let app = runner.start_app(true).await?;
            let stats = app.cache_stats();

            match &app.config().storage {
                StorageConfig::Disk { directory } => {
                    println!("Disk cache: {}", directory.display())
                }
                StorageConfig::Memory { .. } => {
                    println!("Memory cache (contents last for one session only)")
                }
            }
            println!("  Tiles: {}", stats.entries);
            println!("  Size:  {}", format_size(stats.size_bytes as usize));
            if let Some(max) = stats.max_size_bytes {
                println!("  Limit: {}", format_size(max as usize));
            }
            Ok(())
        }
    }
}
