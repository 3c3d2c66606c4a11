//! The 128-bit hash contract used by [`crate::cuckoo`]'s indexing strategy.
//!
//! An element-serializer contract — "an opaque callable that writes bytes of
//! an element into a sink" — producing a 128-bit digest. `std::hash::Hash` is
//! exactly that sink in idiomatic Rust, so every filter element is required
//! to be `impl Hash` rather than a raw byte slice. Two independently seeded
//! `XxHash64` instances stand in for an externally supplied MURMUR3-like
//! hash; only their concatenation's low 64 bits are ever consumed by the
//! indexing arithmetic.

use core::hash::{Hash, Hasher};
use twox_hash::XxHash64;

const SEED_LO: u64 = 0x5bd1_e995_9e37_79b9;
const SEED_HI: u64 = 0xc2b2_ae3d_27d4_eb4f;

/// Hashes `item` to a 128-bit digest. Only the low 64 bits are meaningful to
/// the indexing strategy (see `cuckoo::indexing::split_hash`).
pub(crate) fn digest128(item: impl Hash) -> u128 {
    let mut lo_hasher = XxHash64::with_seed(SEED_LO);
    let mut hi_hasher = XxHash64::with_seed(SEED_HI);
    item.hash(&mut lo_hasher);
    item.hash(&mut hi_hasher);
    let lo = lo_hasher.finish();
    let hi = hi_hasher.finish();
    (u128::from(hi) << 64) | u128::from(lo)
}

/// Hashes a fingerprint value down to 32 bits, for deriving an alternate bucket.
pub(crate) fn hash_fingerprint(fp: u32) -> u32 {
    (digest128(fp) as u64) as u32
}
