//! The fixed bucket-selection mix.
//!
//! Keys are scrambled with the single-word variant of MurmurHash64A before
//! being masked down to a bucket index. There is no seed and no per-table
//! state, so the same key lands in the same bucket for every table of the
//! same size, across processes and builds.
//!
//! This is not a keyed hash and offers no protection against adversarial
//! key sets.

/// MurmurHash64A multiplier.
pub const MULTIPLIER: u64 = 0xc6a4a7935bd1e995;

/// MurmurHash64A shift.
pub const SHIFT: u32 = 47;

/// Fixed seed the initial state is derived from.
pub const SEED: u64 = 0x8445d61a4e774912;

/// Initial state: the seed mixed with the byte width of one key.
const INITIAL: u64 = SEED ^ (size_of::<u64>() as u64).wrapping_mul(MULTIPLIER);

/// Mixes `key` into a 64-bit digest.
///
/// The bucket for a key is `hash_key(key) & mask`.
///
/// # Examples
///
/// ```rust
/// # use chain_hash::hash_key;
/// #
/// assert_eq!(hash_key(0), 0xbfe79f9a85f6b7f2);
/// assert_eq!(hash_key(42), hash_key(42));
/// ```
#[inline(always)]
pub const fn hash_key(key: u64) -> u64 {
    let mut k = key.wrapping_mul(MULTIPLIER);
    k ^= k >> SHIFT;
    k = k.wrapping_mul(MULTIPLIER);

    let mut h = INITIAL ^ k;
    h = h.wrapping_mul(MULTIPLIER);
    h ^= h >> SHIFT;
    h = h.wrapping_mul(MULTIPLIER);
    h ^= h >> SHIFT;
    h
}
