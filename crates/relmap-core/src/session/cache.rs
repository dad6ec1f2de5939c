//! Session object cache.
//!
//! Fixed-capacity map from identity hash to materialized instance. Recency is
//! tracked with a monotonically increasing tick per entry.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::config::FullCachePolicy;

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    hits: u64,
    misses: u64,
    evictions: u64,
    refusals: u64,
}

impl CacheStats {
    /// Get hit count.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Get miss count.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Get eviction count.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Get the number of refused insertions.
    pub fn refusals(&self) -> u64 {
        self.refusals
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits as f64;
        let total = hits + self.misses as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }
}

/// Fixed-capacity instance cache keyed by identity hash.
#[derive(Debug)]
pub struct SessionCache<V> {
    capacity: usize,
    policy: FullCachePolicy,
    entries: HashMap<i32, (V, u64)>,
    recency: BTreeMap<u64, i32>,
    tick: u64,
    stats: CacheStats,
}

impl<V> SessionCache<V> {
    /// Create a cache holding at most `capacity` instances.
    pub fn new(capacity: usize, policy: FullCachePolicy) -> Self {
        Self {
            capacity,
            policy,
            entries: HashMap::with_capacity(capacity),
            recency: BTreeMap::new(),
            tick: 0,
            stats: CacheStats::default(),
        }
    }

    /// Insert an instance.
    ///
    /// Replacing an existing key always succeeds. At capacity the least
    /// recently used entry is evicted, or the insertion is refused and
    /// `false` returned, depending on the policy.
    pub fn insert(&mut self, key: i32, value: V) -> bool {
        let tick = self.next_tick();

        if let Some((_, old_tick)) = self.entries.insert(key, (value, tick)) {
            self.recency.remove(&old_tick);
            self.recency.insert(tick, key);
            return true;
        }

        self.recency.insert(tick, key);

        if self.entries.len() > self.capacity {
            match self.policy {
                FullCachePolicy::Refuse => {
                    self.entries.remove(&key);
                    self.recency.remove(&tick);
                    self.stats.refusals += 1;
                    warn!(key, capacity = self.capacity, "session cache full, insertion refused");
                    return false;
                }
                FullCachePolicy::EvictLeastRecent => {
                    if let Some((_, victim)) = self.recency.pop_first() {
                        self.entries.remove(&victim);
                        self.stats.evictions += 1;
                        debug!(evicted = victim, "session cache evicted least recent entry");
                    }
                }
            }
        }

        // A zero-capacity cache evicts the entry it just inserted.
        self.entries.contains_key(&key)
    }

    /// Look up an instance, marking it as recently used.
    pub fn get(&mut self, key: i32) -> Option<&V> {
        let tick = self.next_tick();
        match self.entries.get_mut(&key) {
            Some((value, last)) => {
                self.recency.remove(last);
                self.recency.insert(tick, key);
                *last = tick;
                self.stats.hits += 1;
                Some(&*value)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Check if an instance is cached, without touching recency.
    pub fn contains(&self, key: i32) -> bool {
        self.entries.contains_key(&key)
    }

    /// Remove an instance.
    pub fn remove(&mut self, key: i32) -> Option<V> {
        let (value, tick) = self.entries.remove(&key)?;
        self.recency.remove(&tick);
        Some(value)
    }

    /// Remove every instance.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    /// Get the current number of cached instances.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of cached instances.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}
