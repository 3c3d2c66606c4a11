//! Cuckoo filter: a bit-packed, bucketed fingerprint table supporting
//! insertion, deletion, lookup, and multiset operations against a
//! compatible peer.
//!
//! Unlike a [`crate::BloomFilter`], a Cuckoo filter supports [`remove`] and
//! can report saturation (`add` returning `false`) instead of silently
//! growing its false-positive rate without bound.
//!
//! [`remove`]: Filter::remove

mod dimension;
mod indexing;
mod serial;
mod table;

use std::hash::Hash;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{Filter, FilterError};
use table::BitPackedTable;

/// The eviction PRNG is reseeded to this constant at construction, `clear`,
/// and `copy`, so that an insertion sequence's saturation behavior is
/// reproducible from an empty filter.
const EVICTION_SEED: u64 = 1;

/// Bounded relocation depth: an insert that can't settle within this many
/// cuckoo kicks is rejected rather than looping forever.
const MAX_KICKS: u16 = 500;

/// A Cuckoo filter.
///
/// ```rust
/// use gauze::{CuckooFilter, Filter};
///
/// let mut filter = CuckooFilter::new(1_000, 0.03).unwrap();
/// filter.add("a");
/// assert!(filter.contains("a"));
/// assert!(filter.remove("a").unwrap());
/// assert!(!filter.contains("a"));
/// ```
#[derive(Clone, Debug)]
pub struct CuckooFilter {
    table: BitPackedTable,
    capacity: u64,
    fpp: f64,
    rng: SmallRng,
}

impl CuckooFilter {
    /// Constructs a new `CuckooFilter` dimensioned to hold `capacity`
    /// elements at false-positive probability `fpp`.
    pub fn new(capacity: u64, fpp: f64) -> Result<CuckooFilter, FilterError> {
        let (num_buckets, entries_per_bucket, bits_per_entry) =
            dimension::dimension(capacity, fpp)?;
        let table = BitPackedTable::new(num_buckets, entries_per_bucket, bits_per_entry)?;

        Ok(CuckooFilter {
            table,
            capacity,
            fpp,
            rng: SmallRng::seed_from_u64(EVICTION_SEED),
        })
    }

    fn index(&self, item: impl Hash) -> (u64, u32) {
        indexing::index_element(item, self.table.num_buckets(), self.table.bits_per_entry())
    }

    fn alt(&self, bucket: u64, fingerprint: u32) -> u64 {
        indexing::alt_index(bucket, fingerprint, self.table.num_buckets())
    }

    /// Attempts to place `fingerprint` starting at `bucket`: an empty slot in
    /// `bucket` or its alternate, or else a bounded eviction chase beginning
    /// at `bucket`. This is the primitive `add` uses once it already has a
    /// fingerprint and a starting bucket (needed by the peer `add_all_from`
    /// operation, which doesn't re-derive a bucket from a hash).
    fn add_at(&mut self, fingerprint: u32, bucket: u64) -> bool {
        if let Some(slot) = self.table.find_empty_slot(bucket) {
            self.table.write_entry(bucket, slot, fingerprint);
            return true;
        }

        let alt_bucket = self.alt(bucket, fingerprint);
        if let Some(slot) = self.table.find_empty_slot(alt_bucket) {
            self.table.write_entry(alt_bucket, slot, fingerprint);
            return true;
        }

        self.relocate(bucket, fingerprint, 0)
    }

    /// Evicts a random slot of `bucket`, relocating its occupant to its
    /// alternate bucket. Recurses until an empty slot absorbs the chain or
    /// `MAX_KICKS` is exceeded, in which case every frame restores the slot
    /// it disturbed before returning `false` — the table ends up
    /// bit-identical to its state before the top-level `add`/`add_at` call.
    fn relocate(&mut self, bucket: u64, fingerprint: u32, depth: u16) -> bool {
        if depth == MAX_KICKS {
            return false;
        }

        let slot = self.rng.gen_range(0..self.table.entries_per_bucket());
        let evicted = self.table.swap_at(bucket, slot, fingerprint);

        if evicted == table::EMPTY {
            return true;
        }

        let next_bucket = self.alt(bucket, evicted);
        if self.relocate(next_bucket, evicted, depth + 1) {
            true
        } else {
            self.table.swap_at(bucket, slot, evicted);
            false
        }
    }
}

impl Filter for CuckooFilter {
    fn add(&mut self, item: impl Hash) -> bool {
        let (bucket, fingerprint) = self.index(item);
        self.add_at(fingerprint, bucket)
    }

    fn contains(&self, item: impl Hash) -> bool {
        let (bucket, fingerprint) = self.index(item);
        self.table.has(fingerprint, bucket) || self.table.has(fingerprint, self.alt(bucket, fingerprint))
    }

    fn remove(&mut self, item: impl Hash) -> Result<bool, FilterError> {
        let (bucket, fingerprint) = self.index(item);

        if let Some(slot) = self.table.find_slot(fingerprint, bucket) {
            self.table.write_entry(bucket, slot, table::EMPTY);
            return Ok(true);
        }

        let alt_bucket = self.alt(bucket, fingerprint);
        if let Some(slot) = self.table.find_slot(fingerprint, alt_bucket) {
            self.table.write_entry(alt_bucket, slot, table::EMPTY);
            return Ok(true);
        }

        Ok(false)
    }

    fn clear(&mut self) {
        self.table.clear();
        self.rng = SmallRng::seed_from_u64(EVICTION_SEED);
    }

    fn len_u64(&self) -> u64 {
        self.table.size()
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn fpp(&self) -> f64 {
        self.fpp
    }

    fn current_fpp(&self) -> f64 {
        let f = f64::from(self.table.bits_per_entry());
        let e = f64::from(self.table.entries_per_bucket());
        let load = self.table.size() as f64 / (self.table.num_buckets() as f64 * e);
        let two_pow_f = 2f64.powf(f);
        1.0 - ((two_pow_f - 2.0) / (two_pow_f - 1.0)).powf(2.0 * e * load)
    }
}

impl CuckooFilter {
    /// Two filters are compatible iff they share identical dimensioning
    /// `(num_buckets, entries_per_bucket, bits_per_entry)` and indexing
    /// strategy. Multiset peer operations reject incompatible peers before
    /// any mutation.
    pub fn is_compatible(&self, other: &CuckooFilter) -> bool {
        self.table.num_buckets() == other.table.num_buckets()
            && self.table.entries_per_bucket() == other.table.entries_per_bucket()
            && self.table.bits_per_entry() == other.table.bits_per_entry()
    }

    fn require_compatible(&self, other: &CuckooFilter) -> Result<(), FilterError> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(FilterError::InvalidArgument {
                argument: "other",
                expected: "a filter with identical dimensioning",
                found: "an incompatible filter".to_string(),
            })
        }
    }

    /// Inserts every fingerprint of `other` into `self`. Returns `false` if
    /// any could not be placed even after eviction kicks at both its bucket
    /// and its alternate; `self` may be partially mutated in that case (no
    /// whole-operation rollback is provided, matching `add`'s documented
    /// no-rollback-across-peers contract).
    pub fn add_all_from(&mut self, other: &CuckooFilter) -> Result<bool, FilterError> {
        self.require_compatible(other)?;

        let mut all_added = true;
        for (bucket, fingerprint) in other.table.iter_occupied() {
            let alt = self.alt(bucket, fingerprint);
            if !self.add_at(fingerprint, bucket) && !self.add_at(fingerprint, alt) {
                all_added = false;
            }
        }
        Ok(all_added)
    }

    /// For each distinct fingerprint in each of `other`'s buckets, requires
    /// `self` to hold at least as many occurrences across the same bucket
    /// and its alternate.
    pub fn contains_all_from(&self, other: &CuckooFilter) -> Result<bool, FilterError> {
        self.require_compatible(other)?;

        for bucket in 0..other.table.num_buckets() {
            for fp in other.table.distinct_fingerprints(bucket) {
                let alt = self.alt(bucket, fp);
                let self_count = self.table.count(fp, bucket) + self.table.count(fp, alt);
                let other_count = other.table.count(fp, bucket) + other.table.count(fp, alt);
                if self_count < other_count {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// For each occurrence of a fingerprint in `other`, removes one matching
    /// occurrence from `self` at the same bucket or its alternate. Returns
    /// `false` (with `self` possibly partially mutated) if no matching slot
    /// can be found for some occurrence.
    pub fn remove_all_from(&mut self, other: &CuckooFilter) -> Result<bool, FilterError> {
        self.require_compatible(other)?;

        let mut all_removed = true;
        for (bucket, fingerprint) in other.table.iter_occupied() {
            let alt = self.alt(bucket, fingerprint);
            if self.table.swap_first(table::EMPTY, fingerprint, bucket) {
                continue;
            }
            if self.table.swap_first(table::EMPTY, fingerprint, alt) {
                continue;
            }
            all_removed = false;
        }
        Ok(all_removed)
    }

    /// Like [`Self::contains_all_from`] but requires count equality rather
    /// than `self` merely dominating `other`.
    pub fn equivalent(&self, other: &CuckooFilter) -> Result<bool, FilterError> {
        Ok(self.contains_all_from(other)? && other.contains_all_from(self)?)
    }

    /// Returns an independent copy sharing no mutable state: the clone's
    /// eviction PRNG is reseeded to the same constant used at construction,
    /// so its future insertion/eviction sequence replays deterministically
    /// from its own history rather than inheriting `self`'s RNG state.
    pub fn copy(&self) -> CuckooFilter {
        CuckooFilter {
            table: self.table.clone(),
            capacity: self.capacity,
            fpp: self.fpp,
            rng: SmallRng::seed_from_u64(EVICTION_SEED),
        }
    }

    /// Serializes this filter to its stable big-endian wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        serial::encode(self.capacity, self.fpp, &self.table)
    }

    /// Reconstructs a `CuckooFilter` from [`Self::to_bytes`]'s output.
    pub fn from_bytes(bytes: &[u8]) -> Result<CuckooFilter, FilterError> {
        let decoded = serial::decode(bytes)?;
        Ok(CuckooFilter {
            table: decoded.table,
            capacity: decoded.capacity,
            fpp: decoded.fpp,
            rng: SmallRng::seed_from_u64(EVICTION_SEED),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_contains() {
        let mut filter = CuckooFilter::new(100, 0.03).unwrap();
        assert!(filter.add("hello"));
        assert!(filter.contains("hello"));
        assert!(!filter.contains("world"));
    }

    #[test]
    fn remove_then_readd() {
        let mut filter = CuckooFilter::new(100, 0.03).unwrap();
        filter.add("x");
        assert_eq!(filter.remove("x"), Ok(true));
        assert!(!filter.contains("x"));
        assert_eq!(filter.len_u64(), 0);
        assert!(filter.add("x"));
        assert!(filter.contains("x"));
    }

    #[test]
    fn remove_missing_returns_false() {
        let mut filter = CuckooFilter::new(100, 0.03).unwrap();
        assert_eq!(filter.remove("never-added"), Ok(false));
    }

    #[test]
    fn saturation_leaves_table_untouched() {
        let mut filter = CuckooFilter::new(1, 0.9).unwrap();
        assert!(filter.add("foo"));
        assert!(filter.add("bar"));
        assert!(filter.add("baz"));
        assert!(filter.add("boz"));

        let before = filter.table.clone();
        let accepted = filter.add("bust");

        if !accepted {
            assert_eq!(filter.table, before);
        }
    }

    #[test]
    fn clear_empties_filter_and_reseeds_rng() {
        let mut filter = CuckooFilter::new(100, 0.03).unwrap();
        filter.add("a");
        filter.clear();
        assert!(filter.is_empty());
        assert!(!filter.contains("a"));
    }

    #[test]
    fn copy_is_independent() {
        let mut filter = CuckooFilter::new(100, 0.03).unwrap();
        filter.add("a");
        let mut copy = filter.copy();
        copy.add("b");

        assert!(!filter.contains("b"));
        assert!(copy.contains("a"));
        assert!(copy.contains("b"));
    }

    #[test]
    fn incompatible_peers_reject_before_mutation() {
        let a = CuckooFilter::new(10, 0.03).unwrap();
        let mut b = CuckooFilter::new(10_000, 0.03).unwrap();
        assert!(!a.is_compatible(&b));

        let before = b.table.clone();
        assert!(b.add_all_from(&a).is_err());
        assert_eq!(b.table, before);
    }

    #[test]
    fn add_all_from_and_contains_all_from_compatible_peer() {
        let mut a = CuckooFilter::new(1000, 0.03).unwrap();
        let mut b = CuckooFilter::new(1000, 0.03).unwrap();
        assert!(a.is_compatible(&b));

        for i in 0..50u32 {
            a.add(i);
        }
        assert!(b.add_all_from(&a).unwrap());
        assert!(b.contains_all_from(&a).unwrap());
        for i in 0..50u32 {
            assert!(b.contains(i));
        }
    }

    #[test]
    fn remove_all_from_undoes_add_all_from() {
        let mut a = CuckooFilter::new(1000, 0.03).unwrap();
        let mut b = CuckooFilter::new(1000, 0.03).unwrap();

        for i in 0..20u32 {
            a.add(i);
        }
        b.add_all_from(&a).unwrap();
        assert!(b.remove_all_from(&a).unwrap());
        assert!(b.is_empty());
    }

    #[test]
    fn equivalent_peers() {
        let mut a = CuckooFilter::new(1000, 0.03).unwrap();
        let mut b = CuckooFilter::new(1000, 0.03).unwrap();

        for i in 0..20u32 {
            a.add(i);
            b.add(i);
        }
        assert!(a.equivalent(&b).unwrap());

        b.add(12345u32);
        assert!(!a.equivalent(&b).unwrap());
    }

    #[test]
    fn serialization_round_trip() {
        let mut filter = CuckooFilter::new(100, 0.032).unwrap();
        for i in 0u32..100 {
            filter.add(i.to_be_bytes());
        }

        let bytes = filter.to_bytes();
        let restored = CuckooFilter::from_bytes(&bytes).unwrap();

        assert_eq!(restored.table, filter.table);
        assert_eq!(restored.capacity, filter.capacity);
        assert_eq!(restored.fpp, filter.fpp);
        for i in 0u32..100 {
            assert!(restored.contains(i.to_be_bytes()));
        }
    }

    #[test]
    fn current_fpp_is_zero_when_empty_and_grows_with_load() {
        let mut filter = CuckooFilter::new(1000, 0.03).unwrap();
        assert_eq!(filter.current_fpp(), 0.0);

        let before = filter.current_fpp();
        for i in 0..500u32 {
            filter.add(i);
        }
        assert!(filter.current_fpp() >= before);
    }

    #[test]
    fn no_false_negatives_across_many_inserted_evens() {
        let mut filter = CuckooFilter::new(1_000_000, 0.03).unwrap();
        for i in (0..200_000u64).step_by(2) {
            filter.add(i.to_string());
        }
        for i in (0..200_000u64).step_by(2) {
            assert!(filter.contains(i.to_string()));
        }
    }

    #[test]
    fn false_positive_rate_is_near_target() {
        let mut filter = CuckooFilter::new(100_000, 0.03).unwrap();
        for i in (0..200_000u64).step_by(2) {
            filter.add(i.to_string());
        }

        let false_positives = (1..20_000u64)
            .step_by(2)
            .filter(|i| filter.contains(i.to_string()))
            .count();
        let rate = false_positives as f64 / 10_000.0;
        assert!(rate < 0.06, "observed false positive rate {rate}");
    }
}
