//! Common types and utilities shared across CLI commands.

use clap::Args;
use console::style;
use dialoguer::theme::ColorfulTheme;
use tilevault::control::Confirm;
use tilevault::coord::LatLngBounds;
use tilevault::events::OfflineEvent;
use tilevault::planner::Viewport;
use tokio::sync::broadcast::{error::TryRecvError, Receiver};

use crate::error::CliError;

/// Viewport given as edge coordinates plus a zoom level.
#[derive(Debug, Clone, Args)]
pub struct ViewportArgs {
    /// Northern edge latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub north: f64,

    /// Western edge longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub west: f64,

    /// Southern edge latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub south: f64,

    /// Eastern edge longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub east: f64,

    /// Current map zoom level
    #[arg(long)]
    pub zoom: u8,
}

impl ViewportArgs {
    /// Validate the edges and build a viewport.
    pub fn to_viewport(&self) -> Result<Viewport, CliError> {
        if self.north < self.south {
            return Err(CliError::InvalidInput(format!(
                "north ({}) must not be below south ({})",
                self.north, self.south
            )));
        }
        let bounds = LatLngBounds::from_edges(self.north, self.west, self.south, self.east)?;
        Ok(Viewport::new(bounds, self.zoom))
    }
}

/// Asks on the terminal before saving or removing tiles.
///
/// A failed prompt (e.g. no TTY) counts as a refusal.
pub struct PromptConfirm;

impl Confirm for PromptConfirm {
    fn confirm_save(&self, n_tiles: u64) -> bool {
        prompt(&format!("Download {} tiles for offline use?", n_tiles))
    }

    fn confirm_removal(&self) -> bool {
        prompt("Remove all saved tiles?")
    }
}

fn prompt(message: &str) -> bool {
    ask_blocking(message, |message| {
        dialoguer::Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(message)
            .default(false)
            .interact()
    })
}

/// Runs a blocking terminal question from inside an async action.
///
/// `block_in_place` hands the worker's other tasks to the rest of the
/// runtime while the terminal waits. Errors count as "no".
fn ask_blocking<F>(message: &str, ask: F) -> bool
where
    F: FnOnce(&str) -> dialoguer::Result<bool>,
{
    tokio::task::block_in_place(|| ask(message)).unwrap_or(false)
}

/// Print one offline event, as a JSON line or a styled status line.
pub fn print_event(event: &OfflineEvent, json: bool) -> Result<(), CliError> {
    if json {
        let line = serde_json::to_string(event).map_err(|e| CliError::Output(e.to_string()))?;
        println!("{}", line);
        return Ok(());
    }

    let name = if event.is_error() {
        style(event.name()).red()
    } else {
        style(event.name()).cyan()
    };

    match event {
        OfflineEvent::SaveStart { n_tiles_to_save } => {
            println!("{} {} tiles", name, n_tiles_to_save)
        }
        OfflineEvent::SaveError { error } | OfflineEvent::RemoveError { error } => {
            println!("{} {}", name, error)
        }
        _ => println!("{}", name),
    }
    Ok(())
}

/// Print every event already delivered to `events`.
pub fn drain_events(events: &mut Receiver<OfflineEvent>, json: bool) -> Result<(), CliError> {
    loop {
        match events.try_recv() {
            Ok(event) => print_event(&event, json)?,
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return Ok(()),
        }
    }
}
