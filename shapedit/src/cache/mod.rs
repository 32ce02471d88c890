//! Memory cache for downloaded basemap tiles.
//!
//! Tiles are cached as the encoded bytes the provider returned, keyed by
//! provider and tile coordinate, with LRU eviction once the byte budget is
//! exceeded.

mod memory;
mod stats;

pub use memory::{TileCache, TileKey, DEFAULT_CACHE_SIZE};
pub use stats::CacheStats;
