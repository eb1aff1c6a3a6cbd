use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;

/// Bounded cache evicting the least recently used entry
pub struct LruCache<K, V> {
    capacity: usize,
    inner: Mutex<LruInner<K, V>>,
}

struct LruInner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    tick: u64,
}

struct CacheEntry<V> {
    value: V,
    last_access: u64,
}

impl<K: Hash + Eq + Clone, V: Clone> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, inner: Mutex::new(LruInner { entries: HashMap::with_capacity(capacity), tick: 0 }) }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;
        inner.entries.get_mut(key).map(|entry| {
            entry.last_access = tick;
            entry.value.clone()
        })
    }

    pub fn insert(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock();
        inner.tick += 1;
        let tick = inner.tick;
        if inner.entries.len() >= self.capacity && !inner.entries.contains_key(&key) {
            let oldest = inner.entries.iter().min_by_key(|(_, entry)| entry.last_access).map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                inner.entries.remove(&oldest);
            }
        }
        inner.entries.insert(key, CacheEntry { value, last_access: tick });
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().entries.remove(key).map(|e| e.value)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cache in front of a store. Entries are filled on read and dropped when the key is staged for writing,
/// so uncommitted data never reaches the cache.
pub struct WriteThroughCache<K, V> {
    inner: LruCache<K, V>,
}

impl<K: Hash + Eq + Clone, V: Clone> WriteThroughCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self { inner: LruCache::new(capacity) }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let c = LruCache::new(2);
        c.insert(1u32, "one");
        c.insert(2u32, "two");
        assert_eq!(c.len(), 2);
        assert_eq!(c.get(&1u32), Some("one"));
        c.insert(3u32, "three");
        assert_eq!(c.len(), 2);
        assert_eq!(c.get(&2u32), None);
        assert_eq!(c.get(&1u32), Some("one"));
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let c = WriteThroughCache::new(0);
        c.insert(1u32, 1u32);
        assert_eq!(c.get(&1), None);
    }
}
