//! Bounded TTL cache
//!
//! Read-through cache for hot, rarely-changing records (venue definitions
//! served to preview and availability reads). Entries expire after a fixed
//! TTL; when full, expired entries are purged and then the oldest insert is
//! evicted.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    ttl: Duration,
    capacity: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.lock().remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let mut entries = self.entries.lock();
        let fresh = entries
            .get(key)
            .map(|e| now.saturating_duration_since(e.inserted_at) < self.ttl)?;
        if fresh {
            entries.get(key).map(|e| e.value.clone())
        } else {
            entries.remove(key);
            None
        }
    }

    fn insert_at(&self, key: K, value: V, now: Instant) {
        let mut entries = self.entries.lock();
        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            let ttl = self.ttl;
            entries.retain(|_, e| now.saturating_duration_since(e.inserted_at) < ttl);
            if entries.len() >= self.capacity
                && let Some(oldest) = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted_at)
                    .map(|(k, _)| k.clone())
            {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_expiry() {
        let cache = TtlCache::new(Duration::from_secs(60), 8);
        let start = Instant::now();
        cache.insert_at(1, "grand", start);

        assert_eq!(cache.get_at(&1, start + Duration::from_secs(59)), Some("grand"));
        assert_eq!(cache.get_at(&1, start + Duration::from_secs(60)), None);
        // Expired entry was dropped on read
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = TtlCache::new(Duration::from_secs(60), 2);
        let start = Instant::now();
        cache.insert_at(1, 'a', start);
        cache.insert_at(2, 'b', start + Duration::from_secs(1));
        cache.insert_at(3, 'c', start + Duration::from_secs(2));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at(&1, start + Duration::from_secs(3)), None);
        assert_eq!(cache.get_at(&3, start + Duration::from_secs(3)), Some('c'));
    }

    #[test]
    fn test_full_cache_prefers_dropping_expired() {
        let cache = TtlCache::new(Duration::from_secs(10), 2);
        let start = Instant::now();
        cache.insert_at(1, 'a', start);
        cache.insert_at(2, 'b', start + Duration::from_secs(8));
        // Key 1 has expired by now, so key 2 survives
        cache.insert_at(3, 'c', start + Duration::from_secs(12));
        assert_eq!(cache.get_at(&2, start + Duration::from_secs(13)), Some('b'));
        assert_eq!(cache.get_at(&3, start + Duration::from_secs(13)), Some('c'));
    }

    #[test]
    fn test_overwrite_and_invalidate() {
        let cache = TtlCache::new(Duration::from_secs(60), 1);
        cache.insert(1, 10);
        cache.insert(1, 11);
        assert_eq!(cache.get(&1), Some(11));
        cache.invalidate(&1);
        assert_eq!(cache.get(&1), None);
    }
}
