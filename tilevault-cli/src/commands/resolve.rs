//! Resolve command: show where a tile would be loaded from.

use clap::Args;
use tilevault::coord::TileCoord;
use tilevault::layer::TileImage;

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Arguments for the resolve command.
#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Tile column
    #[arg(long)]
    pub x: u32,

    /// Tile row
    #[arg(long)]
    pub y: u32,

    /// Zoom level
    #[arg(long)]
    pub z: u8,
}

/// Run the resolve command.
pub async fn run(args: ResolveArgs, options: GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("resolve");

    let app = runner.start_app(true).await?;

    // Range is checked against the layer grid, which retina tiles enlarge.
    let coord = TileCoord {
        x: args.x,
        y: args.y,
        z: args.z,
    };

    match app.layer().resolve(&coord).await? {
        TileImage::Local { url, key, size } => {
            println!("local {} ({} bytes)", url, size);
            println!("  key: {}", key);
            app.layer().release_tile(&url);
        }
        TileImage::Remote { url } => println!("remote {}", url),
    }
    Ok(())
}
