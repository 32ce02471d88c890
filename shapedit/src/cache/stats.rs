//! Cache statistics tracking and reporting.

use std::fmt;

/// Cache statistics for monitoring and debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size_bytes: usize,
    pub entry_count: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: u64) {
        self.evictions += count;
    }

    pub fn update_size(&mut self, size_bytes: usize, entry_count: usize) {
        self.size_bytes = size_bytes;
        self.entry_count = entry_count;
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tiles, {} bytes, hit rate {:.1}% ({} hits, {} misses, {} evictions)",
            self.entry_count,
            self.size_bytes,
            self.hit_rate() * 100.0,
            self.hits,
            self.misses,
            self.evictions
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let mut stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);

        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_display() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.update_size(2048, 2);
        assert_eq!(
            stats.to_string(),
            "2 tiles, 2048 bytes, hit rate 100.0% (1 hits, 0 misses, 0 evictions)"
        );
    }
}
