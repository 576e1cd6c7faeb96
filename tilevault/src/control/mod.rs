//! Save-area and remove-all actions.
//!
//! [`OfflineControl`] is the user-facing side of the offline cache. It plans
//! the tiles of the current viewport, asks the host for confirmation, hands
//! the plan to the tile database and reports progress through an
//! [`EventBus`].

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::ControlSettings;
use crate::coord::MAX_ZOOM;
use crate::events::{EventBus, OfflineEvent};
use crate::layer::OfflineTileLayer;
use crate::planner::{self, PlanError, TileUrl, Viewport};
use crate::store::{DbError, SaveReport};

/// Default lowest zoom from which saving is allowed.
pub const DEFAULT_CONTROL_MIN_ZOOM: u8 = 0;

/// Default deepest zoom saved.
pub const DEFAULT_CONTROL_MAX_ZOOM: u8 = 19;

/// Errors raised by offline actions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    /// Saving was requested below the configured minimum zoom
    #[error("Zoom level {zoom} is below the minimum save zoom {min_zoom}")]
    BelowMinZoom { zoom: u8, min_zoom: u8 },

    /// The tile plan could not be built
    #[error("Failed to plan tiles: {0}")]
    Plan(#[from] PlanError),

    /// The tile database rejected the operation
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Host confirmation prompts.
pub trait Confirm: Send + Sync {
    /// Asked before downloading `n_tiles` tiles.
    fn confirm_save(&self, n_tiles: u64) -> bool;

    /// Asked before removing every stored tile.
    fn confirm_removal(&self) -> bool;
}

/// Confirms every action.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm_save(&self, _n_tiles: u64) -> bool {
        true
    }

    fn confirm_removal(&self) -> bool {
        true
    }
}

/// Zoom bounds for save actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlOptions {
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self {
            min_zoom: DEFAULT_CONTROL_MIN_ZOOM,
            max_zoom: DEFAULT_CONTROL_MAX_ZOOM,
        }
    }
}

impl ControlOptions {
    pub fn from_config(settings: &ControlSettings) -> Self {
        Self {
            min_zoom: settings.min_zoom,
            max_zoom: settings.max_zoom,
        }
    }
}

/// Result of a save action that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(SaveReport),
    Declined,
}

/// Result of a remove action that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    Declined,
}

/// Save and remove actions for an offline layer.
pub struct OfflineControl {
    layer: Arc<OfflineTileLayer>,
    options: ControlOptions,
    confirm: Box<dyn Confirm>,
    events: EventBus,
}

impl OfflineControl {
    pub fn new(layer: Arc<OfflineTileLayer>, options: ControlOptions) -> Self {
        Self {
            layer,
            options: ControlOptions {
                min_zoom: options.min_zoom,
                max_zoom: options.max_zoom.min(MAX_ZOOM),
            },
            confirm: Box::new(AlwaysConfirm),
            events: EventBus::default(),
        }
    }

    /// Replaces the confirmation prompts.
    pub fn with_confirm(mut self, confirm: impl Confirm + 'static) -> Self {
        self.confirm = Box::new(confirm);
        self
    }

    /// Publishes events on `events` instead of a private bus.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn layer(&self) -> &Arc<OfflineTileLayer> {
        &self.layer
    }

    pub fn options(&self) -> &ControlOptions {
        &self.options
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Tiles a save of `viewport` would download.
    ///
    /// Covers zooms from the viewport's zoom through the configured maximum.
    /// A viewport deeper than the maximum plans nothing.
    pub fn plan(&self, viewport: &Viewport) -> Result<Vec<TileUrl>, ControlError> {
        if !self.zoom_in_range(viewport)? {
            return Ok(Vec::new());
        }
        Ok(planner::plan_save(
            self.layer.as_ref(),
            viewport,
            self.options.min_zoom,
            self.options.max_zoom,
        )?)
    }

    /// Number of tiles [`plan`](Self::plan) would list, without listing them.
    pub fn count(&self, viewport: &Viewport) -> Result<u64, ControlError> {
        if !self.zoom_in_range(viewport)? {
            return Ok(0);
        }
        Ok(planner::count_save(
            self.layer.as_ref(),
            viewport,
            self.options.min_zoom,
            self.options.max_zoom,
        )?)
    }

    /// Returns false when the viewport is deeper than the maximum zoom.
    fn zoom_in_range(&self, viewport: &Viewport) -> Result<bool, ControlError> {
        if viewport.zoom < self.options.min_zoom {
            return Err(ControlError::BelowMinZoom {
                zoom: viewport.zoom,
                min_zoom: self.options.min_zoom,
            });
        }
        Ok(viewport.zoom <= self.options.max_zoom)
    }

    /// Saves every tile covering `viewport` for offline use.
    ///
    /// The host confirms the tile count before the plan is built.
    pub async fn save_area(&self, viewport: &Viewport) -> Result<SaveOutcome, ControlError> {
        let n_tiles = match self.count(viewport) {
            Ok(n) => n,
            Err(e) => return Err(self.report_plan_error(e)),
        };

        if !self.confirm.confirm_save(n_tiles) {
            info!(tiles = n_tiles, "Save declined");
            return Ok(SaveOutcome::Declined);
        }

        let tiles = match self.plan(viewport) {
            Ok(tiles) => tiles,
            Err(e) => return Err(self.report_plan_error(e)),
        };

        info!(
            tiles = tiles.len(),
            zoom = viewport.zoom,
            max_zoom = self.options.max_zoom,
            "Saving area"
        );
        self.events.emit(OfflineEvent::SaveStart {
            n_tiles_to_save: tiles.len(),
        });

        match self.layer.database().save_tiles(&tiles).await {
            Ok(report) => {
                self.events.emit(OfflineEvent::SaveEnd);
                Ok(SaveOutcome::Saved(report))
            }
            Err(e) => {
                self.events.emit(OfflineEvent::SaveError {
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    fn report_plan_error(&self, e: ControlError) -> ControlError {
        match &e {
            ControlError::BelowMinZoom { .. } => self.events.emit(OfflineEvent::BelowMinZoomError),
            _ => self.events.emit(OfflineEvent::SaveError {
                error: e.to_string(),
            }),
        }
        e
    }

    /// Removes every stored tile.
    pub async fn remove_all(&self) -> Result<RemoveOutcome, ControlError> {
        if !self.confirm.confirm_removal() {
            info!("Removal declined");
            return Ok(RemoveOutcome::Declined);
        }

        info!("Removing all stored tiles");
        self.events.emit(OfflineEvent::RemoveStart);

        match self.layer.database().clear().await {
            Ok(()) => {
                self.events.emit(OfflineEvent::RemoveEnd);
                Ok(RemoveOutcome::Removed)
            }
            Err(e) => {
                self.events.emit(OfflineEvent::RemoveError {
                    error: e.to_string(),
                });
                Err(e.into())
            }
        }
    }
}
