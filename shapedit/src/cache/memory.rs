//! In-memory tile cache with LRU eviction.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::CacheStats;
use crate::coord::TileCoord;

/// Default cache budget: 256 MB.
pub const DEFAULT_CACHE_SIZE: usize = 256 * 1024 * 1024;

/// Cache key: which provider served which tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub provider: String,
    pub tile: TileCoord,
}

impl TileKey {
    pub fn new(provider: impl Into<String>, tile: TileCoord) -> Self {
        Self {
            provider: provider.into(),
            tile,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    data: Vec<u8>,
    /// Logical clock value of the last access.
    last_accessed: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<TileKey, CacheEntry>,
    size_bytes: usize,
    clock: u64,
    stats: CacheStats,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Evicts least recently used entries until `incoming` more bytes fit.
    fn evict_for(&mut self, incoming: usize, max_size_bytes: usize) {
        if self.size_bytes + incoming <= max_size_bytes {
            return;
        }
        let target = max_size_bytes.saturating_sub(incoming);

        let mut order: Vec<(u64, TileKey)> = self
            .entries
            .iter()
            .map(|(k, v)| (v.last_accessed, k.clone()))
            .collect();
        order.sort_by_key(|(accessed, _)| *accessed);

        let mut evicted = 0u64;
        for (_, key) in order {
            if self.size_bytes <= target {
                break;
            }
            if let Some(entry) = self.entries.remove(&key) {
                self.size_bytes -= entry.data.len();
                evicted += 1;
            }
        }

        if evicted > 0 {
            debug!(evicted, size_bytes = self.size_bytes, "Tile cache eviction");
        }
        self.stats.record_evictions(evicted);
    }
}

/// Bounded tile cache shared between the basemap loader and its tasks.
///
/// Populated lazily as tiles are downloaded; entries are never refreshed.
#[derive(Debug)]
pub struct TileCache {
    inner: Mutex<Inner>,
    max_size_bytes: usize,
}

impl TileCache {
    /// Creates a cache holding at most `max_size_bytes` of tile data.
    pub fn new(max_size_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_size_bytes,
        }
    }

    /// Returns a copy of the cached bytes, refreshing the entry's recency.
    pub fn get(&self, key: &TileKey) -> Option<Vec<u8>> {
        let mut inner = self.inner.lock();
        let now = inner.tick();
        let data = inner.entries.get_mut(key).map(|entry| {
            entry.last_accessed = now;
            entry.data.clone()
        });
        match data {
            Some(data) => {
                inner.stats.record_hit();
                trace!(tile = %key.tile, provider = %key.provider, "Tile cache hit");
                Some(data)
            }
            None => {
                inner.stats.record_miss();
                None
            }
        }
    }

    /// Stores tile bytes. Tiles larger than the whole budget are not cached.
    pub fn put(&self, key: TileKey, data: Vec<u8>) {
        if data.len() > self.max_size_bytes {
            debug!(bytes = data.len(), "Tile larger than cache budget, not cached");
            return;
        }

        let mut inner = self.inner.lock();
        if let Some(old) = inner.entries.remove(&key) {
            inner.size_bytes -= old.data.len();
        }
        inner.evict_for(data.len(), self.max_size_bytes);

        let now = inner.tick();
        inner.size_bytes += data.len();
        inner.entries.insert(
            key,
            CacheEntry {
                data,
                last_accessed: now,
            },
        );
        let (size, count) = (inner.size_bytes, inner.entries.len());
        inner.stats.update_size(size, count);
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn entry_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn size_bytes(&self) -> usize {
        self.inner.lock().size_bytes
    }

    pub fn max_size_bytes(&self) -> usize {
        self.max_size_bytes
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.size_bytes = 0;
        inner.stats.update_size(0, 0);
    }
}

impl Default for TileCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}
