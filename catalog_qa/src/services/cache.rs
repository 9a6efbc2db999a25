use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

use catalog_models::CacheStats;

use crate::errors::{QaError, QaResult};

/// TTL- and size-bounded response cache keyed by request fingerprints.
///
/// Entries are immutable after creation; expiry is lazy (checked on `get`),
/// with `cleanup` available for on-demand purging. At capacity, the entry
/// with the oldest `created_at` is evicted. All state is process-local.
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
    max_size: usize,
    default_ttl: Duration,
    counters: RwLock<Counters>,
}

struct CacheEntry {
    payload: Vec<u8>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Counters {
    hits: u64,
    misses: u64,
}

/// Deterministic digest of the canonical (query, filters) serialization.
/// Filter keys are sorted, so logically identical requests always map to the
/// same fingerprint regardless of key ordering.
pub fn fingerprint(query: &str, filters: Option<&HashMap<String, String>>) -> String {
    let sorted: BTreeMap<&str, &str> = filters
        .map(|f| f.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect())
        .unwrap_or_default();

    let canonical = serde_json::json!({
        "query": query,
        "filters": sorted,
    });

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

impl ResponseCache {
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_size,
            default_ttl,
            counters: RwLock::new(Counters::default()),
        }
    }

    /// Look up a cached payload. Expired or undeserializable entries are
    /// dropped and reported as misses.
    pub fn get<T: DeserializeOwned>(
        &self,
        query: &str,
        filters: Option<&HashMap<String, String>>,
    ) -> Option<T> {
        self.get_with_now(query, filters, Utc::now())
    }

    fn get_with_now<T: DeserializeOwned>(
        &self,
        query: &str,
        filters: Option<&HashMap<String, String>>,
        now: DateTime<Utc>,
    ) -> Option<T> {
        let key = fingerprint(query, filters);

        let payload = match self.entries.get(&key) {
            Some(entry) => {
                if now > entry.expires_at {
                    drop(entry);
                    self.entries.remove(&key);
                    self.counters.write().misses += 1;
                    debug!(key = %key, "cache entry expired");
                    return None;
                }
                entry.payload.clone()
            }
            None => {
                self.counters.write().misses += 1;
                return None;
            }
        };

        match serde_json::from_slice(&payload) {
            Ok(value) => {
                self.counters.write().hits += 1;
                Some(value)
            }
            Err(e) => {
                // Corrupt entry: treat as a miss and drop it.
                let err = QaError::CacheCorruption(e.to_string());
                self.entries.remove(&key);
                self.counters.write().misses += 1;
                debug!(key = %key, "dropping cache entry: {}", err);
                None
            }
        }
    }

    /// Store a payload. Only successfully assembled responses reach this
    /// point; failed requests are never cached.
    pub fn set<T: Serialize>(
        &self,
        query: &str,
        filters: Option<&HashMap<String, String>>,
        payload: &T,
        ttl: Option<Duration>,
    ) -> QaResult<()> {
        self.set_with_now(query, filters, payload, ttl, Utc::now())
    }

    fn set_with_now<T: Serialize>(
        &self,
        query: &str,
        filters: Option<&HashMap<String, String>>,
        payload: &T,
        ttl: Option<Duration>,
        now: DateTime<Utc>,
    ) -> QaResult<()> {
        let data = serde_json::to_vec(payload)?;
        let ttl = ttl.unwrap_or(self.default_ttl);
        let ttl = ChronoDuration::from_std(ttl)
            .map_err(|e| QaError::Internal(format!("invalid cache TTL: {}", e)))?;

        if self.entries.len() >= self.max_size {
            self.evict_oldest();
        }

        let key = fingerprint(query, filters);
        self.entries.insert(
            key,
            CacheEntry {
                payload: data,
                created_at: now,
                expires_at: now + ttl,
            },
        );

        Ok(())
    }

    /// Evict exactly one entry: the one with the oldest `created_at`.
    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.value().created_at)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
            debug!(key = %key, "evicted oldest cache entry");
        }
    }

    /// Purge all expired entries on demand. Returns the number removed.
    pub fn cleanup(&self) -> usize {
        self.cleanup_with_now(Utc::now())
    }

    fn cleanup_with_now(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| now > entry.value().expires_at)
            .map(|entry| entry.key().clone())
            .collect();

        let removed = expired.len();
        for key in expired {
            self.entries.remove(&key);
        }
        removed
    }

    /// Drop every entry. Counters are preserved.
    pub fn clear(&self) -> usize {
        let size = self.entries.len();
        self.entries.clear();
        size
    }

    pub fn stats(&self) -> CacheStats {
        let counters = self.counters.read();
        let total = counters.hits + counters.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            counters.hits as f64 / total as f64 * 100.0
        };

        CacheStats {
            size: self.entries.len(),
            max_size: self.max_size,
            hits: counters.hits,
            misses: counters.misses,
            hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_size: usize) -> ResponseCache {
        ResponseCache::new(max_size, Duration::from_secs(1800))
    }

    fn filters(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_fingerprint_ignores_filter_key_order() {
        let f1 = filters(&[("material", "Cast Metal"), ("category", "finish")]);
        let f2 = filters(&[("category", "finish"), ("material", "Cast Metal")]);
        assert_eq!(
            fingerprint("finishes?", Some(&f1)),
            fingerprint("finishes?", Some(&f2))
        );
    }

    #[test]
    fn test_fingerprint_distinguishes_queries_and_filters() {
        let f = filters(&[("material", "Bronze")]);
        assert_ne!(fingerprint("a", None), fingerprint("b", None));
        assert_ne!(fingerprint("a", None), fingerprint("a", Some(&f)));
    }

    #[test]
    fn test_set_then_get_roundtrip() {
        let cache = cache(10);
        cache.set("q", None, &"payload".to_string(), None).unwrap();
        assert_eq!(cache.get::<String>("q", None), Some("payload".to_string()));
        assert_eq!(cache.get::<String>("other", None), None);
    }

    #[test]
    fn test_ttl_expiry_is_lazy() {
        let cache = cache(10);
        let t0 = Utc::now();
        cache
            .set_with_now("q", None, &"payload".to_string(), Some(Duration::from_secs(1)), t0)
            .unwrap();

        // Still live exactly at the boundary.
        let within = t0 + ChronoDuration::seconds(1);
        assert_eq!(
            cache.get_with_now::<String>("q", None, within),
            Some("payload".to_string())
        );

        // Gone once 1+ second has elapsed, and the entry is removed.
        let after = t0 + ChronoDuration::seconds(2);
        assert_eq!(cache.get_with_now::<String>("q", None, after), None);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_eviction_removes_oldest_created_at() {
        let cache = cache(3);
        let t0 = Utc::now();
        for (i, offset) in [(0, 0), (1, 10), (2, 20)] {
            cache
                .set_with_now(
                    &format!("q{}", i),
                    None,
                    &i,
                    None,
                    t0 + ChronoDuration::seconds(offset),
                )
                .unwrap();
        }

        // Fourth insert evicts exactly one entry: the oldest (q0).
        cache
            .set_with_now("q3", None, &3, None, t0 + ChronoDuration::seconds(30))
            .unwrap();

        assert_eq!(cache.stats().size, 3);
        assert_eq!(cache.get::<i32>("q0", None), None);
        assert_eq!(cache.get::<i32>("q1", None), Some(1));
        assert_eq!(cache.get::<i32>("q2", None), Some(2));
        assert_eq!(cache.get::<i32>("q3", None), Some(3));
    }

    #[test]
    fn test_cleanup_purges_expired_entries() {
        let cache = cache(10);
        let t0 = Utc::now();
        cache
            .set_with_now("short", None, &1, Some(Duration::from_secs(1)), t0)
            .unwrap();
        cache
            .set_with_now("long", None, &2, Some(Duration::from_secs(3600)), t0)
            .unwrap();

        let removed = cache.cleanup_with_now(t0 + ChronoDuration::seconds(5));
        assert_eq!(removed, 1);
        assert_eq!(cache.stats().size, 1);
        assert_eq!(cache.get::<i32>("long", None), Some(2));
    }

    #[test]
    fn test_stats_hit_rate_with_zero_division_guard() {
        let cache = cache(10);
        assert_eq!(cache.stats().hit_rate, 0.0);

        cache.set("q", None, &1, None).unwrap();
        cache.get::<i32>("q", None);
        cache.get::<i32>("q", None);
        cache.get::<i32>("missing", None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_corrupt_entry_is_dropped_and_counted_as_miss() {
        let cache = cache(10);
        cache.set("q", None, &"not a number", None).unwrap();

        // Wrong-typed read: deserialization fails, entry is dropped.
        assert_eq!(cache.get::<i32>("q", None), None);
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_clear_empties_cache() {
        let cache = cache(10);
        cache.set("a", None, &1, None).unwrap();
        cache.set("b", None, &2, None).unwrap();
        assert_eq!(cache.clear(), 2);
        assert_eq!(cache.stats().size, 0);
    }
}
