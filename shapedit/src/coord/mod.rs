//! Coordinate conversion module
//!
//! Conversions between geographic coordinates (longitude/latitude), the
//! Web Mercator plane (EPSG:3857, metres) and slippy-map tile coordinates
//! used by basemap tile servers.

mod types;

pub use types::{
    tile_span, Bounds, CoordError, TileCoord, EARTH_RADIUS, HALF_WORLD, MAX_LAT, MAX_LON,
    MAX_ZOOM, MIN_LAT, MIN_LON, MIN_ZOOM, TILE_SIZE,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 22)
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

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = n as u32 - 1;

    let col = (((lon + 180.0) / 360.0 * n) as u32).min(max_index);

    let lat_rad = lat * PI / 180.0;
    let row = (((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32).min(max_index);

    Ok(TileCoord { row, col, zoom })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.col as f64 / n * 360.0 - 180.0;

    let y = tile.row as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Projects longitude/latitude degrees onto the Web Mercator plane.
///
/// Latitudes beyond the Mercator limit are clamped rather than rejected so
/// that slightly out-of-range data still draws.
#[inline]
pub fn lon_lat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(MIN_LAT, MAX_LAT);
    let x = lon.to_radians() * EARTH_RADIUS;
    let y = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS;
    (x, y)
}

/// Inverse of [`lon_lat_to_mercator`].
#[inline]
pub fn mercator_to_lon_lat(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

/// Tile containing a Web Mercator point, clamped to the valid tile grid.
pub fn mercator_to_tile(x: f64, y: f64, zoom: u8) -> TileCoord {
    let span = tile_span(zoom);
    let max_index = (2_u64.pow(zoom as u32) - 1) as f64;
    let col = ((x + HALF_WORLD) / span).floor().clamp(0.0, max_index) as u32;
    let row = ((HALF_WORLD - y) / span).floor().clamp(0.0, max_index) as u32;
    TileCoord { row, col, zoom }
}

/// Picks the tile zoom whose native resolution best matches drawing
/// `extent_width` metres across `pixel_width` pixels.
pub fn zoom_for_extent(extent_width: f64, pixel_width: u32) -> u8 {
    if extent_width <= 0.0 || pixel_width == 0 {
        return MIN_ZOOM;
    }
    let world_px_needed = pixel_width as f64 * (2.0 * HALF_WORLD) / extent_width;
    let zoom = (world_px_needed / TILE_SIZE as f64).log2().round();
    zoom.clamp(MIN_ZOOM as f64, MAX_ZOOM as f64) as u8
}
