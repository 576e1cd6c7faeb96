//! Remove command: delete every saved tile.

use clap::Args;
use tilevault::control::RemoveOutcome;

use super::common::drain_events;
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Arguments for the remove command.
#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Run the remove command.
pub async fn run(args: RemoveArgs, options: GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("remove");

    let app = runner.start_app(args.yes).await?;
    let mut events = app.events().subscribe();

    let result = app.control().remove_all().await;

    drain_events(&mut events, args.json)?;

    if result? == RemoveOutcome::Declined && !args.json {
        println!("Nothing removed");
    }
    Ok(())
}
