//! Coordinate type definitions

use std::fmt;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom levels offered by common slippy-map tile servers
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// Pixel size of one slippy-map tile
pub const TILE_SIZE: u32 = 256;

/// WGS84 semi-major axis used by EPSG:3857
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the width of the Web Mercator plane in metres
pub const HALF_WORLD: f64 = std::f64::consts::PI * EARTH_RADIUS;

/// Tile coordinates in Web Mercator / Slippy Map system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Y coordinate (north-south), 0 at north
    pub row: u32,
    /// X coordinate (east-west), 0 at west
    pub col: u32,
    /// Zoom level
    pub zoom: u8,
}

impl TileCoord {
    /// Creates a tile coordinate.
    pub fn new(row: u32, col: u32, zoom: u8) -> Self {
        Self { row, col, zoom }
    }

    /// Web Mercator bounds covered by this tile, in metres.
    pub fn mercator_bounds(&self) -> Bounds {
        let span = tile_span(self.zoom);
        let min_x = -HALF_WORLD + self.col as f64 * span;
        let max_y = HALF_WORLD - self.row as f64 * span;
        Bounds::new(min_x, max_y - span, min_x + span, max_y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.col, self.row)
    }
}

/// Width in metres of one tile at `zoom`.
#[inline]
pub fn tile_span(zoom: u8) -> f64 {
    2.0 * HALF_WORLD / 2.0_f64.powi(zoom as i32)
}

/// Axis-aligned bounding box in whatever planar units the caller uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// An inverted box that any `extend` call will overwrite.
    pub fn empty() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY)
    }

    pub fn is_empty(&self) -> bool {
        !(self.min_x <= self.max_x && self.min_y <= self.max_y)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Grows the box to include the point.
    pub fn extend(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Grows the box to include another box.
    pub fn union(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.extend(other.min_x, other.min_y);
        self.extend(other.max_x, other.max_y);
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Returns the box moved by the given offsets.
    pub fn translated(&self, dx: f64, dy: f64) -> Bounds {
        Bounds::new(
            self.min_x + dx,
            self.min_y + dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }

    /// Returns a box with the same centre and `1/scale` of the size.
    pub fn scaled_about_center(&self, scale: f64) -> Bounds {
        let (cx, cy) = self.center();
        let half_w = self.width() / 2.0 / scale;
        let half_h = self.height() / 2.0 / scale;
        Bounds::new(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }

    /// Expands each side by `fraction` of the box size.
    ///
    /// Degenerate boxes (a single point, a horizontal line) get a unit pad so
    /// the result always has area.
    pub fn padded(&self, fraction: f64) -> Bounds {
        let pad_x = if self.width() > 0.0 {
            self.width() * fraction
        } else {
            0.5
        };
        let pad_y = if self.height() > 0.0 {
            self.height() * fraction
        } else {
            0.5
        };
        Bounds::new(
            self.min_x - pad_x,
            self.min_y - pad_y,
            self.max_x + pad_x,
            self.max_y + pad_y,
        )
    }

    /// Expands the shorter axis so the box matches `width / height`.
    pub fn fitted_to_aspect(&self, width: u32, height: u32) -> Bounds {
        if width == 0 || height == 0 || self.is_empty() {
            return *self;
        }
        let target = width as f64 / height as f64;
        let current = self.width() / self.height();
        let (cx, cy) = self.center();
        if current > target {
            let half_h = self.width() / target / 2.0;
            Bounds::new(self.min_x, cy - half_h, self.max_x, cy + half_h)
        } else {
            let half_w = self.height() * target / 2.0;
            Bounds::new(cx - half_w, self.min_y, cx + half_w, self.max_y)
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MinX: {:.2}, MinY: {:.2}, MaxX: {:.2}, MaxY: {:.2}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside valid range (-85.05112878 to 85.05112878)
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// Zoom level is outside valid range
    InvalidZoom(u8),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(
                    f,
                    "Invalid latitude: {} (must be between {} and {})",
                    lat, MIN_LAT, MAX_LAT
                )
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::InvalidZoom(zoom) => {
                write!(
                    f,
                    "Invalid zoom level: {} (must be between {} and {})",
                    zoom, MIN_ZOOM, MAX_ZOOM
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
