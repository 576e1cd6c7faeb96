//! Coordinate type definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.0511287798;
pub const MAX_LAT: f64 = 85.0511287798;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels accepted by the tiling scheme
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 30;

/// Tile coordinates in the slippy map tiling scheme.
///
/// `x` grows eastwards from the antimeridian and `y` grows southwards from
/// the north edge of the Web Mercator square. For the standard 256 px grid a
/// valid tile satisfies `0 <= x, y < 2^z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// X coordinate (east-west), 0 at west
    pub x: u32,
    /// Y coordinate (north-south), 0 at north
    pub y: u32,
    /// Zoom level
    pub z: u8,
}

impl TileCoord {
    /// Creates a tile coordinate, checking it lies inside the grid for `z`.
    pub fn new(x: u32, y: u32, z: u8) -> Result<Self, CoordError> {
        if z > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(z));
        }
        let tile = Self { x, y, z };
        if !tile.is_valid() {
            return Err(CoordError::OutOfRange { x, y, z });
        }
        Ok(tile)
    }

    /// Number of tiles along one axis at zoom `z` (`2^z`).
    #[inline]
    pub fn tiles_per_axis(z: u8) -> u64 {
        1u64 << z.min(MAX_ZOOM)
    }

    /// Returns true when `x` and `y` are both below `2^z`.
    #[inline]
    pub fn is_valid(&self) -> bool {
        let n = Self::tiles_per_axis(self.z);
        self.z <= MAX_ZOOM && (self.x as u64) < n && (self.y as u64) < n
    }

    /// Y coordinate counted from the south edge (TMS convention).
    #[inline]
    pub fn inverted_y(&self) -> u64 {
        Self::tiles_per_axis(self.z)
            .saturating_sub(1)
            .saturating_sub(self.y as u64)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a point, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordError::InvalidLatitude(lat));
        }
        if !lng.is_finite() || !(MIN_LON..=MAX_LON).contains(&lng) {
            return Err(CoordError::InvalidLongitude(lng));
        }
        Ok(Self { lat, lng })
    }
}

/// A geographic bounding box stored as its north-west and south-east corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    north_west: LatLng,
    south_east: LatLng,
}

impl LatLngBounds {
    /// Builds bounds from any two opposite corners.
    pub fn from_corners(a: LatLng, b: LatLng) -> Self {
        Self {
            north_west: LatLng {
                lat: a.lat.max(b.lat),
                lng: a.lng.min(b.lng),
            },
            south_east: LatLng {
                lat: a.lat.min(b.lat),
                lng: a.lng.max(b.lng),
            },
        }
    }

    /// Builds bounds from edge values, validating each corner.
    pub fn from_edges(north: f64, west: f64, south: f64, east: f64) -> Result<Self, CoordError> {
        Ok(Self::from_corners(
            LatLng::new(north, west)?,
            LatLng::new(south, east)?,
        ))
    }

    pub fn north_west(&self) -> LatLng {
        self.north_west
    }

    pub fn south_east(&self) -> LatLng {
        self.south_east
    }

    pub fn north(&self) -> f64 {
        self.north_west.lat
    }

    pub fn south(&self) -> f64 {
        self.south_east.lat
    }

    pub fn west(&self) -> f64 {
        self.north_west.lng
    }

    pub fn east(&self) -> f64 {
        self.south_east.lng
    }
}

/// A point in projected pixel space at a given zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

/// Errors that can occur during coordinate handling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is outside -90..=90 or not a number
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),
    /// Longitude is outside -180..=180 or not a number
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),
    /// Zoom level is above the supported maximum
    #[error("Invalid zoom level: {0} (must be between 0 and 30)")]
    InvalidZoom(u8),
    /// Tile indices fall outside the grid for their zoom
    #[error("Tile {x}/{y} is outside the tile grid at zoom {z}")]
    OutOfRange { x: u32, y: u32, z: u8 },
}
