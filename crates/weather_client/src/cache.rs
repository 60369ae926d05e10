//! Short-TTL cache of samples keyed by site coordinates.
//!
//! Uses `DashMap` so lookups and stores on different coordinates only
//! contend on their own shard. Staleness is checked lazily on lookup.

use std::time::Duration;

use common::{Sample, Site};
use dashmap::DashMap;
use tokio::time::Instant;

/// Bit-exact coordinate pair used as the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey {
    lat_bits: u64,
    lon_bits: u64,
}

impl CoordKey {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat_bits: lat.to_bits(),
            lon_bits: lon.to_bits(),
        }
    }

    pub fn for_site(site: &Site) -> Self {
        Self::new(site.lat, site.lon)
    }
}

/// A cached sample with the instant it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub sample: Sample,
    pub stored_at: Instant,
}

impl CacheEntry {
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

/// Thread-safe sample cache.
#[derive(Debug)]
pub struct ResultCache {
    entries: DashMap<CoordKey, CacheEntry>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Return the cached sample if it is still fresh.
    pub fn lookup(&self, key: &CoordKey) -> Option<Sample> {
        let entry = self.entries.get(key)?;
        if entry.is_stale(self.ttl) {
            return None;
        }
        Some(entry.sample.clone())
    }

    /// Insert or overwrite the entry for `key`, stamped with the current time.
    pub fn store(&self, key: CoordKey, sample: Sample) {
        self.entries.insert(
            key,
            CacheEntry {
                sample,
                stored_at: Instant::now(),
            },
        );
    }

    /// Number of entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}
