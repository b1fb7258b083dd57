//! Key-to-shard routing.
//!
//! A [`Partitioner`] hashes a key with a per-instance seeded `ahash` state and
//! masks the low bits with `shard_count - 1`. The shard count is always a power
//! of two, so the mask replaces a modulo on the hot path.

use ahash::RandomState;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::thread;

/// Lower bound on the default shard count.
pub const MIN_SHARDS: usize = 16;
/// Upper bound on the default shard count.
pub const MAX_SHARDS: usize = 1024;
/// Shards per available hardware thread.
const SHARDS_PER_THREAD: usize = 4;

/// Deterministic key-to-shard mapping, fixed for the lifetime of a cache.
#[derive(Clone)]
pub struct Partitioner {
    mask: usize,
    state: RandomState,
}

impl Partitioner {
    /// Creates a partitioner with a randomly drawn seed.
    ///
    /// `shard_count` is clamped to at least 1 and rounded up to a power of two.
    pub fn new(shard_count: usize) -> Self {
        Self::with_state(shard_count, RandomState::new())
    }

    /// Creates a partitioner whose placement is reproducible across instances.
    pub fn with_seed(shard_count: usize, seed: u64) -> Self {
        Self::with_state(
            shard_count,
            RandomState::with_seeds(
                seed,
                seed.rotate_left(16) ^ 0x243f_6a88_85a3_08d3,
                seed.rotate_left(32) ^ 0x1319_8a2e_0370_7344,
                seed.rotate_left(48) ^ 0xa409_3822_299f_31d0,
            ),
        )
    }

    fn with_state(shard_count: usize, state: RandomState) -> Self {
        let shard_count = shard_count
            .max(1)
            .checked_next_power_of_two()
            .unwrap_or(prev_power_of_two(usize::MAX));
        Self {
            mask: shard_count - 1,
            state,
        }
    }

    pub fn shard_count(&self) -> usize {
        self.mask + 1
    }

    /// Maps `key` to a shard index in `[0, shard_count)`.
    #[inline]
    pub fn shard_for_key<K: Hash + ?Sized>(&self, key: &K) -> usize {
        (self.state.hash_one(key) as usize) & self.mask
    }
}

/// Default shard count for this machine: four shards per hardware thread,
/// rounded up to a power of two and kept within `[MIN_SHARDS, MAX_SHARDS]`.
pub fn default_shard_count() -> usize {
    let parallelism = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    shard_count_for_parallelism(parallelism)
}

pub(crate) fn shard_count_for_parallelism(parallelism: usize) -> usize {
    parallelism
        .saturating_mul(SHARDS_PER_THREAD)
        .checked_next_power_of_two()
        .unwrap_or(MAX_SHARDS)
        .clamp(MIN_SHARDS, MAX_SHARDS)
}

/// Largest power of two that is `<= n`, or 1 when `n` is 0.
pub(crate) fn prev_power_of_two(n: usize) -> usize {
    if n == 0 {
        1
    } else {
        1 << (usize::BITS - 1 - n.leading_zeros())
    }
}
