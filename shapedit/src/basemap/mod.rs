//! Basemap imagery for the map view.
//!
//! [`Basemap`] covers a Web Mercator extent with provider tiles and stitches
//! them into one [`BasemapImage`]. [`BasemapLoader`] runs that work on a
//! tokio runtime so the interface never blocks on the network.

mod loader;

pub use loader::{BasemapLoader, BasemapReply};

use std::io::Cursor;
use std::sync::Arc;

use futures::future::join_all;
use image::{ImageReader, RgbaImage};
use tracing::{debug, info, warn};

use crate::cache::{TileCache, TileKey};
use crate::coord::{mercator_to_tile, zoom_for_extent, Bounds, TileCoord, HALF_WORLD, TILE_SIZE};
use crate::error::NetworkError;
use crate::provider::{AsyncProvider, ProviderError};

/// Upper bound on tiles fetched for one view.
pub const DEFAULT_MAX_TILES: usize = 64;

/// Stitched tiles covering a view, georeferenced in Web Mercator metres.
#[derive(Debug, Clone, PartialEq)]
pub struct BasemapImage {
    pub image: RgbaImage,
    pub bounds: Bounds,
    pub zoom: u8,
}

/// The block of tiles chosen for an extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlan {
    pub zoom: u8,
    pub top_left: TileCoord,
    pub bottom_right: TileCoord,
}

impl TilePlan {
    pub fn columns(&self) -> u32 {
        self.bottom_right.col - self.top_left.col + 1
    }

    pub fn rows(&self) -> u32 {
        self.bottom_right.row - self.top_left.row + 1
    }

    pub fn tile_count(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    /// Tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (self.top_left.row..=self.bottom_right.row).flat_map(move |row| {
            (self.top_left.col..=self.bottom_right.col)
                .map(move |col| TileCoord::new(row, col, self.zoom))
        })
    }

    /// Mercator bounds of the whole block.
    pub fn bounds(&self) -> Bounds {
        let mut bounds = self.top_left.mercator_bounds();
        bounds.union(&self.bottom_right.mercator_bounds());
        bounds
    }
}

/// Fetches and stitches basemap tiles through a shared cache.
pub struct Basemap<P: AsyncProvider> {
    provider: P,
    cache: Arc<TileCache>,
    max_tiles: usize,
}

impl<P: AsyncProvider> Basemap<P> {
    pub fn new(provider: P, cache: Arc<TileCache>) -> Self {
        Self {
            provider,
            cache,
            max_tiles: DEFAULT_MAX_TILES,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cache(&self) -> &Arc<TileCache> {
        &self.cache
    }

    /// Chooses the zoom and tile block for `extent` drawn `canvas_width`
    /// pixels wide. Returns `None` if the extent does not touch the world.
    pub fn plan(&self, extent: &Bounds, canvas_width: u32) -> Option<TilePlan> {
        let world = Bounds::new(-HALF_WORLD, -HALF_WORLD, HALF_WORLD, HALF_WORLD);
        if extent.is_empty() || !extent.intersects(&world) {
            return None;
        }
        let clipped = Bounds::new(
            extent.min_x.max(-HALF_WORLD),
            extent.min_y.max(-HALF_WORLD),
            extent.max_x.min(HALF_WORLD),
            extent.max_y.min(HALF_WORLD),
        );

        let min_zoom = self.provider.min_zoom();
        let max_zoom = self.provider.max_zoom();
        let mut zoom = zoom_for_extent(clipped.width(), canvas_width).clamp(min_zoom, max_zoom);

        loop {
            // Nudge the far corner inwards so an edge on a tile boundary
            // does not pull in an extra row or column.
            let eps = 1e-6;
            let plan = TilePlan {
                zoom,
                top_left: mercator_to_tile(clipped.min_x, clipped.max_y, zoom),
                bottom_right: mercator_to_tile(clipped.max_x - eps, clipped.min_y + eps, zoom),
            };
            if plan.tile_count() <= self.max_tiles || zoom == min_zoom {
                return Some(plan);
            }
            zoom -= 1;
        }
    }

    /// Covers a Web Mercator `extent` with tiles for a canvas of the given
    /// size.
    ///
    /// Tiles come from the cache when present. Tiles that fail to download or
    /// decode are left transparent; the call only fails when every tile
    /// failed.
    pub async fn fetch_tiles(
        &self,
        extent: &Bounds,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Result<BasemapImage, NetworkError> {
        let plan = self.plan(extent, canvas_width).ok_or_else(|| {
            NetworkError::Provider(format!("extent {} is outside the tile grid", extent))
        })?;
        debug!(
            provider = self.provider.name(),
            zoom = plan.zoom,
            tiles = plan.tile_count(),
            canvas_width,
            canvas_height,
            "Fetching basemap tiles"
        );

        let results = join_all(plan.tiles().map(|tile| self.load_tile(tile))).await;

        let mut canvas = RgbaImage::new(plan.columns() * TILE_SIZE, plan.rows() * TILE_SIZE);
        let mut failures = 0usize;
        let mut last_error = None;
        for (tile, result) in plan.tiles().zip(results) {
            match result {
                Ok(img) => {
                    let x = (tile.col - plan.top_left.col) * TILE_SIZE;
                    let y = (tile.row - plan.top_left.row) * TILE_SIZE;
                    image::imageops::replace(&mut canvas, &img, x.into(), y.into());
                }
                Err(e) => {
                    warn!(tile = %tile, provider = self.provider.name(), error = %e, "Basemap tile failed");
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        let attempted = plan.tile_count();
        if failures == attempted {
            return Err(NetworkError::AllTilesFailed {
                attempted,
                last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
            });
        }

        info!(
            provider = self.provider.name(),
            zoom = plan.zoom,
            tiles = attempted,
            failed = failures,
            "Basemap ready"
        );
        Ok(BasemapImage {
            image: canvas,
            bounds: plan.bounds(),
            zoom: plan.zoom,
        })
    }

    async fn load_tile(&self, tile: TileCoord) -> Result<RgbaImage, ProviderError> {
        let key = TileKey::new(self.provider.name(), tile);
        if let Some(bytes) = self.cache.get(&key) {
            if let Ok(img) = decode_tile(&bytes) {
                return Ok(img);
            }
        }

        let bytes = self
            .provider
            .download_tile(tile.row, tile.col, tile.zoom)
            .await?;
        let img = decode_tile(&bytes)?;
        self.cache.put(key, bytes);
        Ok(img)
    }
}

/// Decodes a JPEG or PNG tile to a 256×256 RGBA image.
fn decode_tile(bytes: &[u8]) -> Result<RgbaImage, ProviderError> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ProviderError::InvalidResponse(format!("Format error: {}", e)))?
        .decode()
        .map_err(|e| ProviderError::InvalidResponse(format!("Decode error: {}", e)))?
        .to_rgba8();

    if img.dimensions() == (TILE_SIZE, TILE_SIZE) {
        Ok(img)
    } else {
        Ok(image::imageops::resize(
            &img,
            TILE_SIZE,
            TILE_SIZE,
            image::imageops::FilterType::Triangle,
        ))
    }
}
