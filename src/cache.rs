//! # cache
//!
//! A small TTL map: request signature → previously generated result.
//!
//! * A lookup misses when the key is absent **or** `now > expires_at`.
//! * Expired entries are evicted lazily on that lookup — there is no
//!   background sweep and no capacity bound (the key space is a handful of
//!   symbol/timeframe/limit combinations).
//! * Time comes from [`tokio::time::Instant`], so tests drive expiry with a
//!   paused runtime clock instead of sleeping.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::trace;

// ─── Entry ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    pub created_at: Instant,
    pub expires_at: Instant,
    /// How many lookups this entry has served.
    pub hit_count: u64,
}

impl<V> CacheEntry<V> {
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

// ─── Stats ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped because they had expired.
    pub evictions: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Hits over total lookups (0.0 before the first lookup).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Field-wise sum, used to report several typed caches as one.
    pub fn merge(self, other: CacheStats) -> CacheStats {
        CacheStats {
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            evictions: self.evictions + other.evictions,
            entries: self.entries + other.entries,
        }
    }
}

// ─── TtlCache ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    stats: CacheStats,
}

impl<K, V> Default for TtlCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Lookup against an explicit clock reading.
    pub fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let expired = match self.entries.get_mut(key) {
            None => {
                self.stats.misses += 1;
                return None;
            }
            Some(entry) if entry.is_expired_at(now) => true,
            Some(entry) => {
                entry.hit_count += 1;
                self.stats.hits += 1;
                return Some(entry.data.clone());
            }
        };

        if expired {
            self.entries.remove(key);
            self.stats.evictions += 1;
            self.stats.misses += 1;
            trace!("cache entry expired, evicted");
        }
        None
    }

    pub fn set(&mut self, key: K, value: V, ttl: Duration) {
        self.set_at(key, value, ttl, Instant::now());
    }

    pub fn set_at(&mut self, key: K, value: V, ttl: Duration, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                data: value,
                created_at: now,
                expires_at: now + ttl,
                hit_count: 0,
            },
        );
    }

    /// Drop one entry regardless of its expiry. Returns whether it existed.
    pub fn invalidate(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Raw entry (expired or not) — for diagnostics only, does not count as a lookup.
    pub fn peek(&self, key: &K) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ..self.stats
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_round_trip_then_expiry() {
        let mut cache: TtlCache<&str, Vec<u32>> = TtlCache::new();
        cache.set("k", vec![1, 2, 3], Duration::from_secs(2));
        assert_eq!(cache.get(&"k"), Some(vec![1, 2, 3]));

        // Exactly at expires_at is still a hit; strictly after is a miss
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&"k"), Some(vec![1, 2, 3]));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get(&"k"), None);
        assert!(cache.is_empty(), "expired entry evicted on lookup");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn test_absent_key_is_miss() {
        let mut cache: TtlCache<u8, u8> = TtlCache::new();
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }

    #[test]
    fn test_expired_entries_linger_until_lookup() {
        let t0 = Instant::now();
        let mut cache: TtlCache<u8, u8> = TtlCache::new();
        cache.set_at(1, 10, Duration::from_secs(1), t0);
        cache.set_at(2, 20, Duration::from_secs(1), t0);

        let later = t0 + Duration::from_secs(5);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at(&1, later), None);
        assert_eq!(cache.len(), 1);
        assert!(cache.peek(&2).unwrap().is_expired_at(later));
    }

    #[test]
    fn test_hit_count_and_invalidate() {
        let t0 = Instant::now();
        let mut cache: TtlCache<u8, u8> = TtlCache::new();
        cache.set_at(1, 10, Duration::from_secs(10), t0);
        cache.get_at(&1, t0);
        cache.get_at(&1, t0);
        assert_eq!(cache.peek(&1).unwrap().hit_count, 2);
        assert_eq!(cache.stats().hit_rate(), 1.0);

        assert!(cache.invalidate(&1));
        assert!(!cache.invalidate(&1));
        assert_eq!(cache.get_at(&1, t0), None);
    }

    #[test]
    fn test_set_overwrites_and_resets_expiry() {
        let t0 = Instant::now();
        let mut cache: TtlCache<u8, u8> = TtlCache::new();
        cache.set_at(1, 10, Duration::from_secs(1), t0);
        cache.set_at(1, 11, Duration::from_secs(10), t0 + Duration::from_secs(2));
        assert_eq!(cache.get_at(&1, t0 + Duration::from_secs(5)), Some(11));
    }
}
