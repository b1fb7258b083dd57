//! Construction-time configuration for [`ShardedLruCache`].
//!
//! ```rust
//! use sharded_lru::{CacheBuilder, ShardSizing, ShardedLruCache};
//!
//! let cache: ShardedLruCache<u64, String> = CacheBuilder::new(10_000)
//!     .shards(64)
//!     .sizing(ShardSizing::FitShardCount)
//!     .seed(42)
//!     .build();
//!
//! assert_eq!(cache.num_shards(), 64);
//! assert_eq!(cache.capacity(), 10_000);
//! ```

use crate::error::CacheError;
use crate::partitioner::{default_shard_count, prev_power_of_two};
use crate::ShardedLruCache;
use std::hash::Hash;

/// How to reconcile a total capacity that is smaller than the shard count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShardSizing {
    /// Reduce the shard count to the largest power of two not exceeding the
    /// total capacity. The enforced capacity equals the requested one.
    #[default]
    FitShardCount,
    /// Keep the shard count and give every shard at least one slot. The
    /// enforced capacity may exceed the requested one.
    PerShardMinimum,
}

/// Fluent configuration for a [`ShardedLruCache`].
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    capacity: usize,
    shards: Option<usize>,
    sizing: ShardSizing,
    seed: Option<u64>,
}

/// Resolved shard count and per-shard capacities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    pub(crate) requested: usize,
    pub(crate) sizing: ShardSizing,
    pub(crate) seed: Option<u64>,
    pub(crate) capacities: Vec<usize>,
}

impl CacheBuilder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            shards: None,
            sizing: ShardSizing::default(),
            seed: None,
        }
    }

    /// Sets an explicit shard count. Must be a non-zero power of two.
    ///
    /// Without this, the count is derived from the machine's available
    /// parallelism.
    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = Some(shards);
        self
    }

    pub fn sizing(mut self, sizing: ShardSizing) -> Self {
        self.sizing = sizing;
        self
    }

    /// Fixes the partitioner seed so key placement is reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn try_build<K, V>(self) -> Result<ShardedLruCache<K, V>, CacheError>
    where
        K: Clone + Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        Ok(ShardedLruCache::from_layout(self.layout()?))
    }

    /// # Panics
    ///
    /// Panics if the configuration is invalid (see [`CacheError`]).
    pub fn build<K, V>(self) -> ShardedLruCache<K, V>
    where
        K: Clone + Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        match self.try_build() {
            Ok(cache) => cache,
            Err(err) => panic!("{err}"),
        }
    }

    pub(crate) fn layout(&self) -> Result<Layout, CacheError> {
        if self.capacity == 0 {
            return Err(CacheError::ZeroCapacity);
        }

        let requested_shards = match self.shards {
            Some(n) if n == 0 || !n.is_power_of_two() => {
                return Err(CacheError::InvalidShardCount(n));
            }
            Some(n) => n,
            None => default_shard_count(),
        };
        let num_shards = match self.sizing {
            ShardSizing::FitShardCount => requested_shards.min(prev_power_of_two(self.capacity)),
            ShardSizing::PerShardMinimum => requested_shards,
        };

        // Spread the remainder over the lowest shards so sizes differ by at most one.
        let base = self.capacity / num_shards;
        let remainder = self.capacity % num_shards;
        let capacities = (0..num_shards)
            .map(|i| (if i < remainder { base + 1 } else { base }).max(1))
            .collect();

        Ok(Layout {
            requested: self.capacity,
            sizing: self.sizing,
            seed: self.seed,
            capacities,
        })
    }
}
