//! Bulk tile fetch planning.
//!
//! Given a viewport and a zoom range, the planner lists every tile covering
//! the viewport at each zoom together with its storage key and remote URL.
//! Planning is pure: nothing is downloaded or stored here.

use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coord::{self, LatLngBounds, TileCoord, MAX_ZOOM};
use crate::layer::{LayerError, StorageKey, TileSource};

/// Errors raised while planning a bulk save.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// The current zoom is below the configured minimum
    #[error("Zoom level {zoom} is below the minimum save zoom {min_zoom}")]
    BelowMinZoom { zoom: u8, min_zoom: u8 },

    /// The zoom range is inverted or exceeds the supported maximum
    #[error("Invalid zoom range {min_zoom}..={max_zoom}")]
    InvalidZoomRange { min_zoom: u8, max_zoom: u8 },

    /// URL or key derivation failed
    #[error(transparent)]
    Layer(#[from] LayerError),
}

/// The area the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bounds: LatLngBounds,
    pub zoom: u8,
}

impl Viewport {
    pub fn new(bounds: LatLngBounds, zoom: u8) -> Self {
        Self { bounds, zoom }
    }
}

/// One entry of a bulk-save plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileUrl {
    pub key: StorageKey,
    pub url: String,
}

/// Inclusive box of tile indices at one zoom level.
///
/// Iterates column by column: every `y` of a column in ascending order, then
/// the next `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl TileRange {
    /// Number of tiles in the box.
    pub fn tile_count(&self) -> u64 {
        let width = (self.max_x - self.min_x) as u64 + 1;
        let height = (self.max_y - self.min_y) as u64 + 1;
        width * height
    }

    pub fn contains(&self, tile: &TileCoord) -> bool {
        tile.z == self.zoom
            && (self.min_x..=self.max_x).contains(&tile.x)
            && (self.min_y..=self.max_y).contains(&tile.y)
    }

    pub fn iter(&self) -> TileRangeIter {
        TileRangeIter {
            range: *self,
            x: self.min_x,
            y: self.min_y,
            done: false,
        }
    }
}

impl IntoIterator for TileRange {
    type Item = TileCoord;
    type IntoIter = TileRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the tiles of a [`TileRange`].
#[derive(Debug, Clone)]
pub struct TileRangeIter {
    range: TileRange,
    x: u32,
    y: u32,
    done: bool,
}

impl Iterator for TileRangeIter {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let tile = TileCoord {
            x: self.x,
            y: self.y,
            z: self.range.zoom,
        };

        if self.y < self.range.max_y {
            self.y += 1;
        } else if self.x < self.range.max_x {
            self.x += 1;
            self.y = self.range.min_y;
        } else {
            self.done = true;
        }

        Some(tile)
    }
}

impl FusedIterator for TileRangeIter {}

/// Computes the tile-index box covering `bounds` at `zoom`.
///
/// Corners are projected into pixel space, divided by the source's tile size
/// and floored. Indices are clamped into the source's grid.
pub fn tile_range<S: TileSource + ?Sized>(
    source: &S,
    bounds: &LatLngBounds,
    zoom: u8,
) -> Result<TileRange, PlanError> {
    if zoom > MAX_ZOOM {
        return Err(PlanError::InvalidZoomRange {
            min_zoom: zoom,
            max_zoom: zoom,
        });
    }

    let tile_size = source.tile_size() as f64;
    let grid = (coord::world_size(zoom) / tile_size).ceil();
    let last = grid - 1.0;

    let nw = coord::project(&bounds.north_west(), zoom);
    let se = coord::project(&bounds.south_east(), zoom);

    let index = |pixel: f64| (pixel / tile_size).floor().clamp(0.0, last) as u32;

    Ok(TileRange {
        zoom,
        min_x: index(nw.x),
        min_y: index(nw.y),
        max_x: index(se.x),
        max_y: index(se.y),
    })
}

/// Lists the key/URL pairs covering `bounds` at a single zoom level.
pub fn tiles_for_zoom<S: TileSource + ?Sized>(
    source: &S,
    bounds: &LatLngBounds,
    zoom: u8,
) -> Result<Vec<TileUrl>, PlanError> {
    let range = tile_range(source, bounds, zoom)?;
    range
        .iter()
        .map(|tile| {
            Ok(TileUrl {
                key: source.storage_key(&tile)?,
                url: source.tile_url(&tile)?,
            })
        })
        .collect()
}

/// Lists the key/URL pairs covering `bounds` for every zoom in
/// `min_zoom..=max_zoom`, lowest zoom first.
pub fn plan<S: TileSource + ?Sized>(
    source: &S,
    bounds: &LatLngBounds,
    min_zoom: u8,
    max_zoom: u8,
) -> Result<Vec<TileUrl>, PlanError> {
    if min_zoom > max_zoom || max_zoom > MAX_ZOOM {
        return Err(PlanError::InvalidZoomRange { min_zoom, max_zoom });
    }

    let mut tiles = Vec::new();
    for zoom in min_zoom..=max_zoom {
        tiles.extend(tiles_for_zoom(source, bounds, zoom)?);
    }
    Ok(tiles)
}

/// Counts the tiles [`plan`] would list, without building the list.
pub fn count_tiles<S: TileSource + ?Sized>(
    source: &S,
    bounds: &LatLngBounds,
    min_zoom: u8,
    max_zoom: u8,
) -> Result<u64, PlanError> {
    if min_zoom > max_zoom || max_zoom > MAX_ZOOM {
        return Err(PlanError::InvalidZoomRange { min_zoom, max_zoom });
    }

    (min_zoom..=max_zoom).try_fold(0u64, |total, zoom| {
        let range = tile_range(source, bounds, zoom)?;
        Ok(total.saturating_add(range.tile_count()))
    })
}

/// Counts the tiles [`plan_save`] would list.
pub fn count_save<S: TileSource + ?Sized>(
    source: &S,
    viewport: &Viewport,
    min_zoom: u8,
    max_zoom: u8,
) -> Result<u64, PlanError> {
    check_save_zoom(viewport, min_zoom)?;
    count_tiles(source, &viewport.bounds, viewport.zoom, max_zoom)
}

fn check_save_zoom(viewport: &Viewport, min_zoom: u8) -> Result<(), PlanError> {
    if viewport.zoom < min_zoom {
        return Err(PlanError::BelowMinZoom {
            zoom: viewport.zoom,
            min_zoom,
        });
    }
    Ok(())
}

/// Plans a "save area" action.
///
/// Saving starts at the viewport's zoom, which must be at least
/// `min_zoom`, and goes down to `max_zoom`.
pub fn plan_save<S: TileSource + ?Sized>(
    source: &S,
    viewport: &Viewport,
    min_zoom: u8,
    max_zoom: u8,
) -> Result<Vec<TileUrl>, PlanError> {
    check_save_zoom(viewport, min_zoom)?;
    plan(source, &viewport.bounds, viewport.zoom, max_zoom)
}
