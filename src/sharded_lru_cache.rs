use crate::builder::{CacheBuilder, Layout, ShardSizing};
use crate::error::CacheError;
use crate::partitioner::Partitioner;
use crate::shard::Shard;
use crate::Cache;
use std::hash::Hash;
use tracing::{debug, warn};

/// Whole-cache statistics gathered shard by shard.
///
/// Each shard is sampled under its own lock, one after another, so under
/// concurrent traffic the totals may describe a state that never existed at a
/// single instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_size: usize,
    pub shard_count: usize,
    pub shard_sizes: Vec<usize>,
    pub shard_capacities: Vec<usize>,
    pub total_capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    /// Fraction of `get` calls that found their key, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// A sharded LRU cache for high-concurrency scenarios.
///
/// Keys are routed by a [`Partitioner`] to one of a fixed, power-of-two number
/// of [`Shard`]s, each guarded by its own mutex, so operations on different
/// shards never contend. The cache itself holds no lock.
///
/// Aggregate reads ([`len`](Self::len), [`stats`](Self::stats)) and
/// [`clear`](Self::clear) visit shards one at a time. They are weakly
/// consistent: concurrent writers may be observed on some shards and not on
/// others.
///
/// # Type Parameters
///
/// * `K` - The key type. Must implement `Clone + Hash + Eq + Send + Sync + 'static`
/// * `V` - The value type. Must implement `Clone + Send + Sync + 'static`
///
/// # Examples
///
/// ```rust
/// use sharded_lru::ShardedLruCache;
///
/// let cache = ShardedLruCache::new(1000);
/// cache.put("key1".to_string(), "value1".to_string());
/// assert_eq!(cache.get(&"key1".to_string()), Some("value1".to_string()));
/// assert_eq!(cache.get(&"missing".to_string()), None);
/// ```
pub struct ShardedLruCache<K, V> {
    shards: Vec<Shard<K, V>>,
    partitioner: Partitioner,
    total_capacity: usize,
}

impl<K, V> ShardedLruCache<K, V>
where
    K: Clone + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a sharded LRU cache with the specified total capacity.
    ///
    /// The shard count is derived from available parallelism and reduced when
    /// `capacity` is too small to give every shard a slot.
    ///
    /// # Panics
    ///
    /// Panics if capacity is 0
    pub fn new(capacity: usize) -> Self {
        CacheBuilder::new(capacity).build()
    }

    /// Fallible form of [`new`](Self::new).
    pub fn try_new(capacity: usize) -> Result<Self, CacheError> {
        CacheBuilder::new(capacity).try_build()
    }

    pub(crate) fn from_layout(layout: Layout) -> Self {
        let num_shards = layout.capacities.len();
        let partitioner = match layout.seed {
            Some(seed) => Partitioner::with_seed(num_shards, seed),
            None => Partitioner::new(num_shards),
        };
        let shards: Vec<_> = layout
            .capacities
            .iter()
            .enumerate()
            .map(|(i, &capacity)| Shard::with_index(i, capacity))
            .collect();
        let total_capacity: usize = layout.capacities.iter().sum();

        debug!(
            shards = num_shards,
            shard_capacity = layout.capacities[0],
            total_capacity,
            sizing = ?layout.sizing,
            "created sharded lru cache"
        );
        if total_capacity > layout.requested {
            warn!(
                requested = layout.requested,
                enforced = total_capacity,
                "capacity smaller than shard count, every shard keeps one slot"
            );
        }
        debug_assert!(
            layout.sizing == ShardSizing::PerShardMinimum || total_capacity == layout.requested
        );

        Self {
            shards,
            partitioner,
            total_capacity,
        }
    }

    /// Returns the enforced total capacity, the sum of all shard capacities.
    pub fn capacity(&self) -> usize {
        self.total_capacity
    }

    /// Returns the number of shards in the cache.
    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// Returns the index of the shard that owns `key`.
    pub fn shard_index(&self, key: &K) -> usize {
        self.partitioner.shard_for_key(key)
    }

    fn shard_for(&self, key: &K) -> &Shard<K, V> {
        &self.shards[self.shard_index(key)]
    }

    /// Retrieves a value from the cache by its key.
    ///
    /// If the key exists, the value is cloned and returned, and the entry
    /// is marked as most recently used. A miss has no side effect.
    pub fn get(&self, key: &K) -> Option<V> {
        self.shard_for(key).get(key)
    }

    /// Inserts a key-value pair into the cache.
    ///
    /// If the key already exists, the value is replaced, the entry becomes
    /// most recently used and the old value is returned. Otherwise the entry
    /// is inserted and the owning shard evicts its least recently used
    /// entries until it is back within capacity.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let shard = self.shard_for(&key);
        shard.put(key, value)
    }

    /// Removes an entry from the cache by its key.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.shard_for(key).remove(key)
    }

    /// Returns `true` if `key` is cached, without refreshing its recency.
    pub fn contains(&self, key: &K) -> bool {
        self.shard_for(key).contains(key)
    }

    /// Returns the number of entries in the cache. Weakly consistent.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }

    /// Returns true if every shard was empty when visited.
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|shard| shard.is_empty())
    }

    /// Removes all entries, one shard at a time.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.clear();
        }
        debug!(shards = self.shards.len(), "cleared cache");
    }

    /// Per-shard sizes plus aggregate counters. Weakly consistent.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            total_size: 0,
            shard_count: self.shards.len(),
            shard_sizes: Vec::with_capacity(self.shards.len()),
            shard_capacities: Vec::with_capacity(self.shards.len()),
            total_capacity: self.total_capacity,
            hits: 0,
            misses: 0,
            evictions: 0,
        };
        for shard in &self.shards {
            let snap = shard.snapshot();
            stats.total_size += snap.len;
            stats.shard_sizes.push(snap.len);
            stats.shard_capacities.push(snap.capacity);
            stats.hits += snap.hits;
            stats.misses += snap.misses;
            stats.evictions += snap.evictions;
        }
        stats
    }

    /// Checks every shard's recency list against its lookup table.
    pub fn check_invariants(&self) -> Result<(), CacheError> {
        self.shards.iter().try_for_each(Shard::check_invariants)
    }
}

impl<K, V> Cache<K, V> for ShardedLruCache<K, V>
where
    K: Clone + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        self.get(key)
    }

    fn put(&self, key: K, value: V) -> Option<V> {
        self.put(key, value)
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.remove(key)
    }

    fn len(&self) -> usize {
        self.len()
    }

    fn is_empty(&self) -> bool {
        self.is_empty()
    }

    fn clear(&self) {
        self.clear()
    }
}
