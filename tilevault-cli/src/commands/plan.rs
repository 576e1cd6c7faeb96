//! Plan command: list the tiles a save would download.

use clap::Args;
use serde_json::json;
use tilevault::planner;

use super::common::ViewportArgs;
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Arguments for the plan command.
#[derive(Debug, Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub viewport: ViewportArgs,

    /// Deepest zoom to plan (defaults to control.max_zoom)
    #[arg(long)]
    pub max_zoom: Option<u8>,

    /// Print one JSON object per tile
    #[arg(long)]
    pub json: bool,
}

/// Run the plan command.
pub async fn run(args: PlanArgs, options: GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("plan");

    let app = runner.start_app(true).await?;
    let viewport = args.viewport.to_viewport()?;

    let tiles = match args.max_zoom {
        Some(max_zoom) => {
            let min_zoom = app.control().options().min_zoom;
            planner::plan_save(app.layer().as_ref(), &viewport, min_zoom, max_zoom)
                .map_err(|e| CliError::Action(e.into()))?
        }
        None => app.control().plan(&viewport)?,
    };

    for tile in &tiles {
        if args.json {
            println!("{}", json!({ "key": tile.key, "url": tile.url }));
        } else {
            println!("{}", tile.url);
        }
    }

    if !args.json {
        eprintln!("{} tiles", tiles.len());
    }
    Ok(())
}
