//! A bounded, sharded LRU (Least Recently Used) cache for concurrent
//! in-process workloads.
//!
//! Keys are spread over a power-of-two number of independently locked
//! [`Shard`]s. Each shard keeps an arena-backed recency list and evicts its
//! least recently used entry whenever an insert pushes it past capacity, so
//! the cache never holds more entries than it was configured for.
//!
//! # Features
//!
//! - Per-shard locking: operations on different shards never contend
//! - O(1) `get`, `put` and eviction
//! - Capacity enforced on every insert
//! - Generic keys and values, no per-entry dynamic typing
//! - Weakly consistent aggregate reads (`len`, `stats`, `clear`) with no global lock
//!
//! # Examples
//!
//! ```rust
//! use sharded_lru::{Cache, ShardedLruCache};
//!
//! let cache: ShardedLruCache<String, String> = ShardedLruCache::new(1_000_000);
//! cache.put("user:1".to_string(), "Tony".to_string());
//! cache.put("user:2".to_string(), "Ayo".to_string());
//!
//! assert_eq!(cache.get(&"user:1".to_string()), Some("Tony".to_string()));
//! assert_eq!(cache.get(&"nonexistent".to_string()), None);
//!
//! // Anything implementing `Cache` can be used behind a trait object.
//! let dyn_cache: &dyn Cache<String, String> = &cache;
//! assert_eq!(dyn_cache.len(), 2);
//! ```

pub mod builder;
pub mod error;
pub mod partitioner;
mod recency_list;
pub mod shard;
pub mod sharded_lru_cache;

use std::hash::Hash;

pub use builder::{CacheBuilder, ShardSizing};
pub use error::CacheError;
pub use partitioner::Partitioner;
pub use shard::{Shard, ShardSnapshot};
pub use sharded_lru_cache::{CacheStats, ShardedLruCache};

/// The core operations shared by a single [`Shard`] and the whole
/// [`ShardedLruCache`].
///
/// # Type Parameters
///
/// * `K` - The type of keys used in the cache. Must implement `Clone + Hash + Eq + Send + Sync + 'static`
/// * `V` - The type of values stored in the cache. Must implement `Clone + Send + Sync + 'static`
pub trait Cache<K, V>: Send + Sync
where
    K: Clone + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Retrieves a value from the cache by its key.
    ///
    /// If the key exists, the value is cloned and returned, and the entry
    /// is marked as most recently used.
    ///
    /// # Returns
    ///
    /// * `Some(V)` if the key exists
    /// * `None` if the key doesn't exist
    fn get(&self, key: &K) -> Option<V>;

    /// Inserts a key-value pair into the cache.
    ///
    /// If the key already exists, the value is updated and the old value
    /// is returned. If the insert exceeds capacity, least recently used
    /// entries are evicted until it no longer does.
    ///
    /// # Returns
    ///
    /// * `Some(V)` if the key already existed (returns the old value)
    /// * `None` if the key didn't exist
    fn put(&self, key: K, value: V) -> Option<V>;

    /// Removes an entry from the cache by its key.
    fn remove(&self, key: &K) -> Option<V>;

    /// Returns the number of entries in the cache.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all entries from the cache.
    fn clear(&self);
}
