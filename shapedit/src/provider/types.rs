//! Provider types and traits

use std::fmt;
use std::future::Future;

/// Errors that can occur during provider operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// HTTP request failed
    HttpError(String),
    /// Zoom level not supported by this provider
    UnsupportedZoom(u8),
    /// Tile coordinates outside the zoom level's grid
    UnsupportedCoordinates { row: u32, col: u32, zoom: u8 },
    /// Invalid response data from provider
    InvalidResponse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::UnsupportedZoom(zoom) => {
                write!(f, "Zoom level {} not supported by provider", zoom)
            }
            ProviderError::UnsupportedCoordinates { row, col, zoom } => write!(
                f,
                "Tile ({}, {}) does not exist at zoom {}",
                row, col, zoom
            ),
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Async source of 256×256 Web Mercator basemap tiles.
pub trait AsyncProvider: Send + Sync {
    /// Downloads one tile.
    ///
    /// # Arguments
    ///
    /// * `row` - Tile row (north to south)
    /// * `col` - Tile column (west to east)
    /// * `zoom` - Zoom level
    ///
    /// # Returns
    ///
    /// Encoded image bytes (JPEG or PNG) or an error.
    fn download_tile(
        &self,
        row: u32,
        col: u32,
        zoom: u8,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    /// Returns the provider's name for logging and identification.
    fn name(&self) -> &str;

    /// Returns the minimum supported zoom level.
    fn min_zoom(&self) -> u8;

    /// Returns the maximum supported zoom level.
    fn max_zoom(&self) -> u8;

    /// Checks if this provider supports the given zoom level.
    fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.min_zoom() && zoom <= self.max_zoom()
    }
}

/// Validates a request against the provider's zoom range and the tile grid.
pub(crate) fn check_tile<P: AsyncProvider + ?Sized>(
    provider: &P,
    row: u32,
    col: u32,
    zoom: u8,
) -> Result<(), ProviderError> {
    if !provider.supports_zoom(zoom) {
        return Err(ProviderError::UnsupportedZoom(zoom));
    }
    let tiles = 1u64 << zoom;
    if row as u64 >= tiles || col as u64 >= tiles {
        return Err(ProviderError::UnsupportedCoordinates { row, col, zoom });
    }
    Ok(())
}
