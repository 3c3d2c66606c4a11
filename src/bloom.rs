//! Bloom filter: a thin adapter over a bit-array membership primitive.
//!
//! Provided for API parity with [`crate::cuckoo::CuckooFilter`] under the
//! shared [`Filter`] trait. The bit array itself, the Kirsch-Mitzenmacher
//! double hashing scheme, and the false-positive-rate formulas below are the
//! pre-existing primitive this crate adapts — see `DESIGN.md` for what
//! carried over unchanged and what was renamed to fit [`Filter`].

use bitvec::{bitvec, prelude::*};
use std::{
    f64::consts::LN_2,
    hash::{Hash, Hasher},
    sync::LazyLock,
};
use twox_hash::XxHash64;

use crate::Filter;
use crate::FilterError;

static SEED: LazyLock<u64> = LazyLock::new(rand::random::<u64>);
const MAX_FILTER_BIT_SIZE: u64 = 200_000_000_000;

/// A Bloom filter is a space-efficient probabilistic data structure to test
/// whether an item is a member of a set.
///
/// It never returns false negatives but may return false positives. Items
/// can only be added, not deleted — [`Filter::remove`] reports
/// [`FilterError::Unsupported`].
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct BloomFilter {
    array: BitVec,
    capacity: u64,
    target_fpp: f64,
    hash_fn_count: u64,
    bit_size: u64,
}

impl Filter for BloomFilter {
    fn add(&mut self, item: impl Hash) -> bool {
        for idx in self.bit_indexes(item) {
            self.array.set(idx as usize, true);
        }
        true
    }

    fn contains(&self, item: impl Hash) -> bool {
        self.bit_indexes(item)
            .into_iter()
            .all(|idx| *self.array.get(idx as usize).expect("index within bit_size"))
    }

    fn clear(&mut self) {
        self.array = bitvec![usize, Lsb0; 0; self.bit_size as usize];
    }

    fn len_u64(&self) -> u64 {
        self.count_approx()
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn fpp(&self) -> f64 {
        self.target_fpp
    }

    fn current_fpp(&self) -> f64 {
        let occupied_ratio = self.array.count_ones() as f64 / self.bit_size as f64;
        (1.0 - (1.0 - occupied_ratio).powf(self.hash_fn_count as f64)).powf(self.hash_fn_count as f64)
    }
}

impl BloomFilter {
    /// Constructs a new `BloomFilter`.
    ///
    /// * `capacity`: intended number of elements the filter should hold
    /// * `target_fpp`: acceptable false positive rate at that capacity
    ///
    /// Fails for invalid parameters or if the filter would be too large for
    /// this architecture's address space.
    pub fn new(capacity: u64, target_fpp: f64) -> Result<BloomFilter, FilterError> {
        if capacity < 1 {
            return Err(FilterError::InvalidArgument {
                argument: "capacity",
                expected: "capacity >= 1",
                found: capacity.to_string(),
            });
        }
        if !(0.0..1.0).contains(&target_fpp) || target_fpp == 0.0 {
            return Err(FilterError::InvalidArgument {
                argument: "target_fpp",
                expected: "0.0 < target_fpp < 1.0",
                found: target_fpp.to_string(),
            });
        }

        let optimal_bit_size = optimal_bit_size(capacity, target_fpp)?;
        let hash_fn_count = optimal_hash_fn_count(optimal_bit_size, capacity);
        let bit_size = match optimal_bit_size % hash_fn_count {
            0 => optimal_bit_size,
            remainder => optimal_bit_size + (hash_fn_count - remainder),
        };
        let false_positive_rate = false_positive_rate(bit_size, capacity, hash_fn_count);
        let array = bitvec![usize, Lsb0; 0; bit_size as usize];

        Ok(BloomFilter {
            capacity,
            target_fpp: false_positive_rate,
            bit_size,
            hash_fn_count,
            array,
        })
    }

    /// Returns an *approximation* of the number of elements added.
    pub fn count_approx(&self) -> u64 {
        let num_truthy_bits = self.array.count_ones() as u64;
        approximate_elems(self.bit_size, self.hash_fn_count, num_truthy_bits).round() as u64
    }

    /// Returns the number of bits backing the filter.
    pub fn bit_size(&self) -> u64 {
        self.bit_size
    }

    /// Returns the number of hash functions the filter uses.
    pub fn hash_fn_count(&self) -> u64 {
        self.hash_fn_count
    }

    /// Calculates an `item`'s bit indexes via Kirsch-Mitzenmacher double hashing.
    fn bit_indexes<T>(&self, item: T) -> Vec<u64>
    where
        T: Hash,
    {
        let mut hasher_1 = XxHash64::default();
        let mut hasher_2 = XxHash64::with_seed(*SEED);

        item.hash(&mut hasher_1);
        item.hash(&mut hasher_2);

        let hash_1 = hasher_1.finish();
        let hash_2 = hasher_2.finish();

        (0..self.hash_fn_count)
            .map(|i| hash_1.wrapping_add(i.wrapping_mul(hash_2)) % self.bit_size)
            .collect()
    }
}

/// Calculates the false positive rate of a Bloom filter with the given parameters.
fn false_positive_rate(bit_size: u64, capacity: u64, hash_fn_count: u64) -> f64 {
    (1.0 - (-1.0 * hash_fn_count as f64 * (capacity as f64 + 0.5) / (bit_size as f64 - 1.0)).exp())
        .powf(hash_fn_count as f64)
}

/// Calculates the optimal bit size for `capacity` elements at `target_fpp`.
fn optimal_bit_size(capacity: u64, target_fpp: f64) -> Result<u64, FilterError> {
    let bit_size = (-1.0 * capacity as f64 * target_fpp.ln() / LN_2.powi(2)).ceil();

    if !bit_size.is_finite() || bit_size > MAX_FILTER_BIT_SIZE as f64 {
        return Err(FilterError::InvalidArgument {
            argument: "capacity/target_fpp",
            expected: "a bit size within the platform's addressable range",
            found: bit_size.to_string(),
        });
    }

    Ok(bit_size as u64)
}

/// Calculates the optimal number of hash functions for `bit_size` and `capacity`.
fn optimal_hash_fn_count(bit_size: u64, capacity: u64) -> u64 {
    (((bit_size as f64 / capacity as f64) * LN_2).round() as u64).max(1)
}

/// Approximates the number of items in the filter from its occupied-bit count.
fn approximate_elems(bit_size: u64, hash_fn_count: u64, num_truthy_bits: u64) -> f64 {
    let m = bit_size as f64;
    let k = hash_fn_count as f64;
    let x = num_truthy_bits as f64;

    -1.0 * (m * (1.0 - x / m).ln()) / k
}
