//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude),
//! Web Mercator pixel space and slippy map tile coordinates.

mod types;

pub use types::{
    CoordError, LatLng, LatLngBounds, PixelPoint, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT,
    MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Pixel size of one tile in the reference projection.
///
/// The projection scale is always `256 * 2^zoom`, whatever tile size a layer
/// uses. Layers with other tile sizes divide projected pixels by their own size.
pub const BASE_TILE_SIZE: f64 = 256.0;

/// Returns the width of the world in pixels at the given zoom.
#[inline]
pub fn world_size(zoom: u8) -> f64 {
    BASE_TILE_SIZE * 2.0_f64.powi(zoom as i32)
}

/// Projects a geographic point into pixel space at the given zoom.
///
/// Latitude is clamped to the Web Mercator range first, so polar points land
/// on the top or bottom edge rather than at infinity.
#[inline]
pub fn project(point: &LatLng, zoom: u8) -> PixelPoint {
    let scale = world_size(zoom);
    let lat = point.lat.clamp(MIN_LAT, MAX_LAT);
    let lat_rad = lat * PI / 180.0;

    PixelPoint {
        x: (point.lng + 180.0) / 360.0 * scale,
        y: (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * scale,
    }
}

/// Converts a pixel position at the given zoom back to a geographic point.
#[inline]
pub fn unproject(pixel: &PixelPoint, zoom: u8) -> LatLng {
    let scale = world_size(zoom);
    let lng = pixel.x / scale * 360.0 - 180.0;
    let lat_rad = (PI * (1.0 - 2.0 * pixel.y / scale)).sinh().atan();

    LatLng {
        lat: lat_rad * 180.0 / PI,
        lng,
    }
}

/// Converts geographic coordinates to standard 256 px tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.0511287798 to 85.0511287798)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 30)
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let pixel = project(&LatLng { lat, lng: lon }, zoom);
    let last = (TileCoord::tiles_per_axis(zoom) - 1) as f64;

    // The east and south edges belong to the last tile, not a tile past the grid
    let x = (pixel.x / BASE_TILE_SIZE).floor().clamp(0.0, last) as u32;
    let y = (pixel.y / BASE_TILE_SIZE).floor().clamp(0.0, last) as u32;

    Ok(TileCoord { x, y, z: zoom })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let corner = unproject(
        &PixelPoint {
            x: tile.x as f64 * BASE_TILE_SIZE,
            y: tile.y as f64 * BASE_TILE_SIZE,
        },
        tile.z,
    );
    (corner.lat, corner.lng)
}

/// Returns the geographic bounds covered by a standard 256 px tile.
pub fn tile_bounds(tile: &TileCoord) -> LatLngBounds {
    let (north, west) = tile_to_lat_lon(tile);
    let next = TileCoord {
        x: tile.x + 1,
        y: tile.y + 1,
        z: tile.z,
    };
    let (south, east) = tile_to_lat_lon(&next);

    LatLngBounds::from_corners(
        LatLng {
            lat: north,
            lng: west,
        },
        LatLng {
            lat: south,
            lng: east,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let result = to_tile_coords(40.7128, -74.0060, 16);
        assert!(result.is_ok(), "Valid coordinates should not error");

        let tile = result.unwrap();
        assert_eq!(tile.x, 19295);
        assert_eq!(tile.y, 24640);
        assert_eq!(tile.z, 16);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = to_tile_coords(90.0, 0.0, 10);
        assert!(matches!(
            result.unwrap_err(),
            CoordError::InvalidLatitude(_)
        ));
    }

    #[test]
    fn test_east_edge_maps_to_last_tile() {
        let tile = to_tile_coords(0.0, 180.0, 3).unwrap();
        assert_eq!(tile.x, 7);
    }

    #[test]
    fn test_tile_coord_new_rejects_out_of_range() {
        assert!(TileCoord::new(7, 7, 3).is_ok());
        assert_eq!(
            TileCoord::new(8, 0, 3),
            Err(CoordError::OutOfRange { x: 8, y: 0, z: 3 })
        );
        assert_eq!(TileCoord::new(0, 0, 31), Err(CoordError::InvalidZoom(31)));
    }

    #[test]
    fn test_inverted_y() {
        let tile = TileCoord::new(1, 2, 3).unwrap();
        assert_eq!(tile.inverted_y(), 5);
    }

    #[test]
    fn test_project_origin_and_corners() {
        let centre = project(&LatLng { lat: 0.0, lng: 0.0 }, 0);
        assert!((centre.x - 128.0).abs() < 1e-9);
        assert!((centre.y - 128.0).abs() < 1e-9);

        let north_west = project(
            &LatLng {
                lat: MAX_LAT,
                lng: -180.0,
            },
            1,
        );
        assert!(north_west.x.abs() < 1e-9);
        assert!(north_west.y.abs() < 1e-6);
    }

    #[test]
    fn test_project_clamps_poles() {
        let pole = project(&LatLng { lat: 90.0, lng: 0.0 }, 2);
        let edge = project(
            &LatLng {
                lat: MAX_LAT,
                lng: 0.0,
            },
            2,
        );
        assert_eq!(pole, edge);
    }

    #[test]
    fn test_tile_to_lat_lon_northwest_corner() {
        let tile = TileCoord {
            x: 19295,
            y: 24640,
            z: 16,
        };

        let (lat, lon) = tile_to_lat_lon(&tile);

        assert!(
            (lat - 40.713).abs() < 0.01,
            "Latitude should be close to 40.713"
        );
        assert!(
            (lon - (-74.007)).abs() < 0.01,
            "Longitude should be close to -74.007"
        );
    }

    #[test]
    fn test_tile_bounds_contain_tile() {
        let tile = TileCoord { x: 5, y: 9, z: 4 };
        let bounds = tile_bounds(&tile);
        let centre = LatLng {
            lat: (bounds.north() + bounds.south()) / 2.0,
            lng: (bounds.west() + bounds.east()) / 2.0,
        };
        assert_eq!(to_tile_coords(centre.lat, centre.lng, 4).unwrap(), tile);
    }

    #[test]
    fn test_bounds_from_corners_normalises() {
        let bounds = LatLngBounds::from_corners(
            LatLng {
                lat: 10.0,
                lng: 20.0,
            },
            LatLng {
                lat: 30.0,
                lng: -5.0,
            },
        );
        assert_eq!(bounds.north(), 30.0);
        assert_eq!(bounds.south(), 10.0);
        assert_eq!(bounds.west(), -5.0);
        assert_eq!(bounds.east(), 20.0);
    }

    #[test]
    fn test_lat_lng_rejects_nan() {
        assert!(LatLng::new(f64::NAN, 0.0).is_err());
        assert!(LatLng::new(0.0, 181.0).is_err());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_roundtrip_property(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=18
            ) {
                let tile = to_tile_coords(lat, lon, zoom)?;
                let (converted_lat, converted_lon) = tile_to_lat_lon(&tile);

                let tile_size = 360.0 / (2.0_f64.powi(zoom as i32));

                prop_assert!((converted_lat - lat).abs() < tile_size);
                prop_assert!((converted_lon - lon).abs() < tile_size);
            }

            #[test]
            fn test_tile_coords_in_bounds(
                lat in -85.05..85.05_f64,
                lon in -180.0..=180.0_f64,
                zoom in 0u8..=18
            ) {
                let tile = to_tile_coords(lat, lon, zoom)?;
                prop_assert!(tile.is_valid());
                prop_assert_eq!(tile.z, zoom);
            }

            #[test]
            fn test_project_unproject_roundtrip(
                lat in -85.0..85.0_f64,
                lng in -180.0..180.0_f64,
                zoom in 0u8..=20
            ) {
                let back = unproject(&project(&LatLng { lat, lng }, zoom), zoom);
                prop_assert!((back.lat - lat).abs() < 1e-6);
                prop_assert!((back.lng - lng).abs() < 1e-6);
            }
        }
    }
}
