use thiserror::Error;

/// Errors produced while constructing or validating a cache.
///
/// Lookups and inserts never fail; a miss is reported as `None`. The only
/// failure paths are an invalid configuration at construction time and a
/// corrupted shard detected by [`check_invariants`].
///
/// [`check_invariants`]: crate::ShardedLruCache::check_invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("capacity must be greater than 0")]
    ZeroCapacity,

    #[error("shard count must be a non-zero power of two, got {0}")]
    InvalidShardCount(usize),

    #[error("shard invariant violated: {0}")]
    Invariant(String),
}
