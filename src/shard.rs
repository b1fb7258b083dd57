use crate::error::CacheError;
use crate::recency_list::{NodeId, RecencyList};
use crate::Cache;
use ahash::RandomState;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::mem;
use tracing::trace;

// Up-front reservation per shard; larger shards grow on demand.
const PREALLOC_LIMIT: usize = 4096;

struct Entry<K, V> {
    key: K,
    value: V,
}

// Lookup table and recency list are only ever touched together, under the
// shard's mutex.
struct ShardInner<K, V> {
    capacity: usize,
    map: HashMap<K, NodeId, RandomState>,
    list: RecencyList<Entry<K, V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<K, V> ShardInner<K, V>
where
    K: Clone + Hash + Eq,
    V: Clone,
{
    fn new(capacity: usize) -> Self {
        let reserved = capacity.min(PREALLOC_LIMIT);
        Self {
            capacity,
            map: HashMap::with_capacity_and_hasher(reserved, RandomState::new()),
            list: RecencyList::with_capacity(reserved),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    fn get(&mut self, key: &K) -> Option<V> {
        let Some(&id) = self.map.get(key) else {
            self.misses += 1;
            return None;
        };
        self.list.move_to_front(id);
        self.hits += 1;
        self.list.get(id).map(|entry| entry.value.clone())
    }

    // Returns the replaced value and the number of entries evicted.
    fn put(&mut self, key: K, value: V) -> (Option<V>, usize) {
        if let Some(&id) = self.map.get(&key) {
            let old = self
                .list
                .get_mut(id)
                .map(|entry| mem::replace(&mut entry.value, value));
            self.list.move_to_front(id);
            return (old, 0);
        }

        let id = self.list.push_front(Entry {
            key: key.clone(),
            value,
        });
        self.map.insert(key, id);

        let mut evicted = 0;
        while self.list.len() > self.capacity {
            if self.evict_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        (None, evicted)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.map.remove(key)?;
        self.list.remove(id).map(|entry| entry.value)
    }

    /// Drops the entry just ahead of the tail sentinel. No-op on an empty shard.
    fn evict_lru(&mut self) -> Option<Entry<K, V>> {
        let entry = self.list.pop_back()?;
        self.map.remove(&entry.key);
        self.evictions += 1;
        Some(entry)
    }

    fn clear(&mut self) {
        self.map.clear();
        self.list.clear();
    }

    fn check_invariants(&self, index: usize) -> Result<(), CacheError> {
        let len = self.list.len();
        if len != self.map.len() {
            return Err(CacheError::Invariant(format!(
                "shard {index}: list holds {len} entries but lookup table holds {}",
                self.map.len()
            )));
        }
        if len > self.capacity {
            return Err(CacheError::Invariant(format!(
                "shard {index}: {len} entries exceed capacity {}",
                self.capacity
            )));
        }

        let mut walked = 0;
        for (id, entry) in self.list.iter() {
            walked += 1;
            if self.map.get(&entry.key) != Some(&id) {
                return Err(CacheError::Invariant(format!(
                    "shard {index}: list node {walked} is not referenced by the lookup table"
                )));
            }
        }
        if walked != len {
            return Err(CacheError::Invariant(format!(
                "shard {index}: walked {walked} nodes but recorded size is {len}"
            )));
        }
        Ok(())
    }
}

/// Point-in-time view of one shard, taken under its lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardSnapshot {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// One independently locked LRU partition.
///
/// A shard owns its lookup table and recency list behind a single
/// [`parking_lot::Mutex`]. Every operation, `get` included, takes that lock
/// exclusively because a hit reorders the recency list. After `put` returns
/// the shard never holds more than `capacity` entries.
///
/// A shard is a complete bounded LRU cache on its own:
///
/// ```rust
/// use sharded_lru::{Cache, Shard};
///
/// let shard = Shard::new(2);
/// shard.put("a", 1);
/// shard.put("b", 2);
/// shard.get(&"a");
/// shard.put("c", 3);
///
/// assert_eq!(shard.get(&"b"), None);
/// assert_eq!(shard.get(&"a"), Some(1));
/// assert_eq!(shard.len(), 2);
/// ```
pub struct Shard<K, V> {
    index: usize,
    inner: Mutex<ShardInner<K, V>>,
}

impl<K, V> Shard<K, V>
where
    K: Clone + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a shard holding at most `capacity` entries (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        Self::with_index(0, capacity)
    }

    pub(crate) fn with_index(index: usize, capacity: usize) -> Self {
        Self {
            index,
            inner: Mutex::new(ShardInner::new(capacity.max(1))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Returns `true` if `key` is resident, without refreshing its recency.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().map.contains_key(key)
    }

    pub fn snapshot(&self) -> ShardSnapshot {
        let inner = self.inner.lock();
        ShardSnapshot {
            len: inner.list.len(),
            capacity: inner.capacity,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        }
    }

    /// Walks the recency list and cross-checks it against the lookup table.
    pub fn check_invariants(&self) -> Result<(), CacheError> {
        self.inner.lock().check_invariants(self.index)
    }
}

impl<K, V> Cache<K, V> for Shard<K, V>
where
    K: Clone + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key)
    }

    fn put(&self, key: K, value: V) -> Option<V> {
        let (old, evicted) = self.inner.lock().put(key, value);
        if evicted > 0 {
            trace!(shard = self.index, evicted, "evicted least recently used entries");
        }
        old
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key)
    }

    fn len(&self) -> usize {
        self.inner.lock().list.len()
    }

    fn is_empty(&self) -> bool {
        self.inner.lock().list.is_empty()
    }

    fn clear(&self) {
        self.inner.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> String {
        s.to_string()
    }

    #[test]
    fn test_get_refreshes_recency() {
        let shard = Shard::new(2);
        shard.put(key("A"), 1);
        shard.put(key("B"), 2);
        assert_eq!(shard.get(&key("A")), Some(1));

        shard.put(key("C"), 3);

        assert_eq!(shard.get(&key("B")), None);
        assert_eq!(shard.get(&key("A")), Some(1));
        assert_eq!(shard.get(&key("C")), Some(3));
        assert_eq!(shard.len(), 2);
    }

    #[test]
    fn test_put_overwrite_refreshes_recency() {
        let shard = Shard::new(2);
        shard.put(1, "one");
        shard.put(2, "two");
        assert_eq!(shard.put(1, "uno"), Some("one"));
        assert_eq!(shard.len(), 2);

        shard.put(3, "three");
        assert_eq!(shard.get(&2), None);
        assert_eq!(shard.get(&1), Some("uno"));
    }

    #[test]
    fn test_eviction_follows_insertion_order() {
        let shard = Shard::new(3);
        for i in 0..3 {
            shard.put(i, i);
        }
        shard.put(3, 3);
        assert!(!shard.contains(&0));
        shard.put(4, 4);
        assert!(!shard.contains(&1));
        assert!(shard.contains(&2));
        assert!(shard.contains(&3));
        assert!(shard.contains(&4));
    }

    #[test]
    fn test_capacity_holds_after_every_put() {
        let shard = Shard::new(5);
        for i in 0..100 {
            shard.put(i, i * 2);
            assert!(shard.len() <= 5);
            shard.check_invariants().unwrap();
        }
        assert_eq!(shard.snapshot().evictions, 95);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let shard = Shard::new(0);
        assert_eq!(shard.capacity(), 1);
        shard.put("a", 1);
        shard.put("b", 2);
        assert_eq!(shard.len(), 1);
        assert_eq!(shard.get(&"b"), Some(2));
    }

    #[test]
    fn test_huge_capacity_allocates_lazily() {
        let shard = Shard::new(usize::MAX / 2);
        assert_eq!(shard.capacity(), usize::MAX / 2);
        assert_eq!(shard.put(1, 1), None);
        assert_eq!(shard.get(&1), Some(1));
        shard.check_invariants().unwrap();
    }

    #[test]
    fn test_miss_leaves_order_untouched() {
        let shard = Shard::new(2);
        shard.put("a", 1);
        shard.put("b", 2);
        assert_eq!(shard.get(&"missing"), None);
        assert_eq!(shard.len(), 2);

        shard.put("c", 3);
        assert!(!shard.contains(&"a"));
        assert!(shard.contains(&"b"));
    }

    #[test]
    fn test_contains_does_not_refresh() {
        let shard = Shard::new(2);
        shard.put("a", 1);
        shard.put("b", 2);
        assert!(shard.contains(&"a"));
        shard.put("c", 3);
        assert!(!shard.contains(&"a"));
    }

    #[test]
    fn test_remove() {
        let shard = Shard::new(3);
        shard.put("a", 1);
        shard.put("b", 2);
        assert_eq!(shard.remove(&"a"), Some(1));
        assert_eq!(shard.remove(&"a"), None);
        assert_eq!(shard.len(), 1);
        shard.check_invariants().unwrap();
    }

    #[test]
    fn test_clear_then_reuse() {
        let shard = Shard::new(2);
        shard.put("a", 1);
        shard.put("b", 2);
        shard.clear();
        assert!(shard.is_empty());
        assert_eq!(shard.get(&"a"), None);

        shard.put("c", 3);
        assert_eq!(shard.get(&"c"), Some(3));
        shard.check_invariants().unwrap();
    }

    #[test]
    fn test_snapshot_counts_hits_and_misses() {
        let shard = Shard::new(4);
        shard.put("a", 1);
        shard.get(&"a");
        shard.get(&"a");
        shard.get(&"z");

        let snap = shard.snapshot();
        assert_eq!(snap.len, 1);
        assert_eq!(snap.capacity, 4);
        assert_eq!(snap.hits, 2);
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.evictions, 0);
    }

    #[test]
    fn test_evict_lru_on_empty_is_noop() {
        let mut inner: ShardInner<u32, u32> = ShardInner::new(2);
        assert!(inner.evict_lru().is_none());
        assert_eq!(inner.evictions, 0);
        assert!(inner.check_invariants(0).is_ok());
    }

    #[test]
    fn test_check_invariants_detects_orphaned_table_entry() {
        let shard = Shard::new(4);
        shard.put(1, 1);
        shard.put(2, 2);
        {
            let mut inner = shard.inner.lock();
            let id = inner.map[&1];
            inner.list.remove(id);
        }
        assert!(matches!(
            shard.check_invariants(),
            Err(CacheError::Invariant(_))
        ));
    }
}
