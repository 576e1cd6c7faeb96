//! Save command: download a viewport for offline use.

use clap::Args;
use console::style;
use tilevault::config::format_size;
use tilevault::control::SaveOutcome;

use super::common::{drain_events, ViewportArgs};
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Arguments for the save command.
#[derive(Debug, Args)]
pub struct SaveArgs {
    #[command(flatten)]
    pub viewport: ViewportArgs,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Run the save command.
pub async fn run(args: SaveArgs, options: GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("save");

    let app = runner.start_app(args.yes).await?;
    let viewport = args.viewport.to_viewport()?;
    let mut events = app.events().subscribe();

    let result = app.control().save_area(&viewport).await;

    drain_events(&mut events, args.json)?;

    match result? {
        SaveOutcome::Saved(report) => {
            if !args.json {
                println!(
                    "{} Saved {} tiles ({})",
                    style("✓").green(),
                    report.saved,
                    format_size(report.bytes as usize)
                );
            }
        }
        SaveOutcome::Declined => {
            if !args.json {
                println!("Nothing saved");
            }
        }
    }
    Ok(())
}
