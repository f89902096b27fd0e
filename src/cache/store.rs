//! Cache Store Module
//!
//! The TTL/LRU cache: HashMap storage combined with explicit recency
//! ordering and per-entry expiration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, RecencyList};
use crate::clock::{Clock, SystemClock};

// == TTL/LRU Cache ==
/// Bounded key-value store with per-entry expiration and least-recently-used
/// eviction on overflow.
///
/// Expiry is enforced lazily: every read treats an entry past its expiration
/// as absent (and evicts it as a side effect); `prune` is the only eager
/// sweep and is caller-invoked. No operation blocks or suspends.
#[derive(Debug)]
pub struct TtlLruCache<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Explicit access ordering for eviction
    recency: RecencyList,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_size: usize,
    /// Default TTL in milliseconds for entries without an explicit override
    default_ttl_ms: u64,
    /// Time source
    clock: Arc<dyn Clock>,
}

impl<V> TtlLruCache<V> {
    // == Constructors ==
    /// Creates a new cache with the given capacity and default TTL, using
    /// the system clock.
    ///
    /// A `max_size` of 0 is a valid degenerate configuration: every
    /// insertion first evicts everything, so at most the newest entry
    /// survives until the next insertion.
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self::with_clock(max_size, default_ttl, Arc::new(SystemClock))
    }

    /// Creates a new cache with an injected clock.
    pub fn with_clock(max_size: usize, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            recency: RecencyList::new(),
            stats: CacheStats::new(),
            max_size,
            default_ttl_ms: default_ttl.as_millis() as u64,
            clock,
        }
    }

    // == Set ==
    /// Stores a key-value pair with an optional TTL override.
    ///
    /// Overwriting an existing key replaces its value and expiry and counts
    /// as a recency touch, not as a new capacity-consuming entry. Otherwise,
    /// while the cache is at capacity, the least recently used entry is
    /// evicted before insertion.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let key = key.into();
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite {
            while self.entries.len() >= self.max_size {
                match self.recency.pop_oldest() {
                    Some(evicted) => {
                        self.entries.remove(&evicted);
                        self.stats.record_eviction();
                        debug!(key = %evicted, "evicted least recently used entry");
                    }
                    None => break,
                }
            }
        }

        let ttl_ms = ttl
            .map(|d| d.as_millis() as u64)
            .unwrap_or(self.default_ttl_ms);
        let now_ms = self.clock.now_ms();

        self.entries
            .insert(key.clone(), CacheEntry::new(value, now_ms, ttl_ms));
        self.recency.touch(&key);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether an entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.recency.forget(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Clear ==
    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.stats.set_total_entries(0);
    }

    // == Prune ==
    /// Eagerly removes every expired entry and returns the number removed.
    pub fn prune(&mut self) -> usize {
        let now_ms = self.clock.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now_ms))
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in &expired_keys {
            self.entries.remove(key);
            self.recency.forget(key);
        }

        if count > 0 {
            self.stats.record_expirations(count as u64);
            self.stats.set_total_entries(self.entries.len());
            debug!(removed = count, "pruned expired entries");
        }
        count
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Length ==
    /// Returns the number of entries currently stored.
    ///
    /// Expired-but-not-yet-swept entries still count until touched or
    /// explicitly pruned.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> TtlLruCache<V> {
    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns the value if present and unexpired, marking it most recently
    /// used. An expired entry is evicted as a side effect and treated as
    /// absent.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now_ms = self.clock.now_ms();

        if let Some(entry) = self.entries.get(key) {
            if entry.is_expired(now_ms) {
                self.entries.remove(key);
                self.recency.forget(key);
                self.stats.record_expirations(1);
                self.stats.set_total_entries(self.entries.len());
                self.stats.record_miss();
                return None;
            }

            let value = entry.value.clone();
            self.stats.record_hit();
            self.recency.touch(key);
            Some(value)
        } else {
            self.stats.record_miss();
            None
        }
    }

    // == Has ==
    /// Returns whether `key` resolves to a live entry.
    ///
    /// Defined literally as `get(key).is_some()` so it can never diverge
    /// from `get`'s expiry semantics; like `get`, it touches recency.
    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const TTL: Duration = Duration::from_secs(300);

    fn manual_cache(max_size: usize) -> (TtlLruCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let cache = TtlLruCache::with_clock(max_size, TTL, clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_new_cache_is_empty() {
        let cache: TtlLruCache<String> = TtlLruCache::new(100, TTL);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_and_get() {
        let (mut cache, _) = manual_cache(100);

        cache.set("key1", "value1".to_string(), None);

        assert_eq!(cache.get("key1").as_deref(), Some("value1"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_nonexistent() {
        let (mut cache, _) = manual_cache(100);
        assert_eq!(cache.get("nonexistent"), None);
    }

    #[test]
    fn test_overwrite_replaces_value_and_keeps_size() {
        let (mut cache, _) = manual_cache(100);

        cache.set("key1", "value1".to_string(), None);
        cache.set("key1", "value2".to_string(), None);

        assert_eq!(cache.get("key1").as_deref(), Some("value2"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_delete() {
        let (mut cache, _) = manual_cache(100);

        cache.set("key1", "value1".to_string(), None);

        assert!(cache.delete("key1"));
        assert!(cache.is_empty());
        assert_eq!(cache.get("key1"), None);
    }

    #[test]
    fn test_delete_nonexistent_returns_false() {
        let (mut cache, _) = manual_cache(100);
        assert!(!cache.delete("nonexistent"));
    }

    #[test]
    fn test_clear() {
        let (mut cache, _) = manual_cache(100);

        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
    }

    #[test]
    fn test_ttl_expiration() {
        let (mut cache, clock) = manual_cache(100);

        cache.set("key1", "value1".to_string(), Some(Duration::from_millis(50)));

        assert!(cache.has("key1"));

        clock.advance(60);

        assert_eq!(cache.get("key1"), None);
        assert!(!cache.has("key1"));
    }

    #[test]
    fn test_ttl_override_beats_default() {
        let (mut cache, clock) = manual_cache(100);

        cache.set("short", "v".to_string(), Some(Duration::from_millis(10)));
        cache.set("long", "v".to_string(), None);

        clock.advance(20);

        assert_eq!(cache.get("short"), None);
        assert!(cache.get("long").is_some());
    }

    #[test]
    fn test_lru_eviction_order() {
        let (mut cache, _) = manual_cache(3);

        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);
        cache.set("c", "3".to_string(), None);

        // Cache is full; inserting d evicts a (least recently used).
        cache.set("d", "4".to_string(), None);

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("a"), None);
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn test_lru_get_refreshes_recency() {
        let (mut cache, _) = manual_cache(3);

        cache.set("a", "1".to_string(), None);
        cache.set("b", "2".to_string(), None);
        cache.set("c", "3".to_string(), None);

        // Refresh a; b is now the eviction candidate.
        cache.get("a").unwrap();

        cache.set("d", "4".to_string(), None);

        assert!(cache.get("a").is_some());
        assert_eq!(cache.get("b"), None);
        assert!(cache.get("c").is_some());
        assert!(cache.get("d").is_some());
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let (mut cache, _) = manual_cache(2);

        for i in 0..10 {
            cache.set(format!("key{i}"), "v".to_string(), None);
            assert!(cache.len() <= 2);
        }
    }

    #[test]
    fn test_zero_capacity_degenerate() {
        let (mut cache, _) = manual_cache(0);

        cache.set("a", "1".to_string(), None);
        // Each insertion evicts down to empty first.
        cache.set("b", "2".to_string(), None);

        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_len_counts_expired_until_swept() {
        let (mut cache, clock) = manual_cache(100);

        cache.set("key1", "v".to_string(), Some(Duration::from_millis(10)));
        clock.advance(20);

        // Not yet touched, still physically stored.
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.get("key1"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_prune_removes_only_expired() {
        let (mut cache, clock) = manual_cache(100);

        cache.set("short", "v".to_string(), Some(Duration::from_millis(10)));
        cache.set("long", "v".to_string(), Some(Duration::from_secs(10)));

        clock.advance(20);

        let removed = cache.prune();
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("long").is_some());
    }

    #[test]
    fn test_prune_empty_cache() {
        let (mut cache, _) = manual_cache(100);
        assert_eq!(cache.prune(), 0);
    }

    #[test]
    fn test_overwrite_resets_expiry() {
        let (mut cache, clock) = manual_cache(100);

        cache.set("key1", "v1".to_string(), Some(Duration::from_millis(50)));
        clock.advance(40);
        cache.set("key1", "v2".to_string(), Some(Duration::from_millis(50)));
        clock.advance(40);

        // 80ms after first set, but only 40ms after the overwrite.
        assert_eq!(cache.get("key1").as_deref(), Some("v2"));
    }

    #[test]
    fn test_stats_tracking() {
        let (mut cache, clock) = manual_cache(2);

        cache.set("a", "1".to_string(), Some(Duration::from_millis(10)));
        cache.get("a"); // hit
        cache.get("missing"); // miss
        clock.advance(20);
        cache.get("a"); // expired: expiration + miss
        cache.set("b", "2".to_string(), None);
        cache.set("c", "3".to_string(), None);
        cache.set("d", "4".to_string(), None); // evicts b

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.total_entries, 2);
    }
}
