//! Derives a primary bucket, fingerprint, and alternate bucket from an
//! element's hash.
//!
//! The alternate-index formula differs from the original cuckoo-filter
//! paper's `i XOR hash(fp)`, which requires a power-of-two bucket count.
//! Here `altIndex` is a parity-sign-adjusted additive offset, which admits
//! any even `num_buckets` and is its own inverse (see `alt_index`'s doc).

use crate::hash::{digest128, hash_fingerprint};
use std::hash::Hash;

/// Identifies this indexing strategy in the serial wire format. Bumped only
/// if the bucket/fingerprint derivation changes in a way that would make an
/// old filter's bytes disagree with a new one's.
pub(crate) const STRATEGY_ORDINAL: i8 = 1;

/// Splits a 128-bit digest's low 64 bits into two 32-bit sub-hashes.
fn split_hash(digest: u128) -> (u32, u32) {
    let low64 = digest as u64;
    ((low64 & 0xFFFF_FFFF) as u32, (low64 >> 32) as u32)
}

/// `hash1 mod num_buckets`, unsigned over the full 64-bit range.
pub(crate) fn primary_index(hash1: u32, num_buckets: u64) -> u64 {
    u64::from(hash1) % num_buckets
}

/// Scans `hash2` in `bits_per_entry`-bit windows from the low end upward,
/// returning the first non-zero window. If every window is zero, returns
/// `1` rather than the reserved empty value `0`.
pub(crate) fn fingerprint(hash2: u32, bits_per_entry: u8) -> u32 {
    let f = u32::from(bits_per_entry);
    let mask = if f == 32 { u32::MAX } else { (1u32 << f) - 1 };

    let windows = 32u32.div_ceil(f);
    for w in 0..windows {
        let shift = w * f;
        if shift >= 32 {
            break;
        }
        let window = (hash2 >> shift) & mask;
        if window != 0 {
            return window;
        }
    }
    1
}

/// Computes `element`'s `(primary_bucket, fingerprint)` pair.
pub(crate) fn index_element(element: impl Hash, num_buckets: u64, bits_per_entry: u8) -> (u64, u32) {
    let digest = digest128(element);
    let (hash1, hash2) = split_hash(digest);
    let bucket = primary_index(hash1, num_buckets);
    let fp = fingerprint(hash2, bits_per_entry);
    (bucket, fp)
}

/// `(i + off) mod m` computed without risking signed-overflow in the
/// intermediate sum: if `i + off` would wrap past `i64`'s bounds, `m` is
/// subtracted from `i` first (preserving `i`'s residue mod `m`) before the
/// addition is retried.
fn protected_sum(i: i64, off: i64, m: i64) -> i64 {
    match i.checked_add(off) {
        Some(v) => v,
        None => protected_sum(i - m, off, m),
    }
}

/// `parsign(i) := +1` if `i` is even, `-1` if `i` is odd.
fn parsign(i: u64) -> i64 {
    if i % 2 == 0 {
        1
    } else {
        -1
    }
}

/// `altIndex(i, fp, num_buckets) = (i + parsign(i) * odd(H(fp))) mod num_buckets`.
///
/// Reversible: `num_buckets` is even and `odd(H(fp))` is odd, so applying
/// `alt_index` flips `i`'s parity each time; since the offset magnitude is
/// invariant under `fp`, applying it twice returns to `i` exactly.
pub(crate) fn alt_index(i: u64, fingerprint: u32, num_buckets: u64) -> u64 {
    let offset = i64::from(hash_fingerprint(fingerprint) | 1);
    let signed_offset = parsign(i) * offset;
    let sum = protected_sum(i as i64, signed_offset, num_buckets as i64);
    sum.rem_euclid(num_buckets as i64) as u64
}
