//! # Gauze
//!
//! A collection of probabilistic set membership filters with a simple interface.
//! These filters can claim that a given entry is
//!
//! * definitely not represented in a set of entries, or
//! * might be represented in the set.
//!
//! Two filters are provided, sharing the [`Filter`] capability set:
//!
//! * [`BloomFilter`] — compact, no deletions.
//! * [`CuckooFilter`] — slightly larger per entry, supports deletion and
//!   multiset operations (union/containment/difference) against a compatible peer.
//!
//! ## Gauze in Action
//!
//! ```rust
//! use gauze::{CuckooFilter, Filter};
//!
//! let mut filter = CuckooFilter::new(1_000, 0.03).expect("couldn't construct Cuckoo filter.");
//!
//! filter.add(&"key1");
//! filter.add(&"key2");
//!
//! assert!(filter.contains(&"key1"));
//! assert!(filter.contains(&"key2"));
//!
//! filter.remove(&"key1").unwrap();
//! assert!(!filter.contains(&"key1"));
//! ```

use core::hash::Hash;
use thiserror::Error;

/// An error returned by a method provided by the [`Filter`] trait, or by a
/// [`CuckooFilter`] peer operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// A required element, collection, or peer argument was absent.
    #[error("argument must not be absent: {argument}")]
    NullArgument {
        /// Name of the missing argument.
        argument: &'static str,
    },
    /// A method is called with an out-of-range or incompatible parameter.
    #[error("invalid argument {argument}: expected {expected}, found {found}")]
    InvalidArgument {
        /// The parameter name.
        argument: &'static str,
        /// What was expected of it.
        expected: &'static str,
        /// What was actually given.
        found: String,
    },
    /// The operation is an optional part of the [`Filter`] contract and this
    /// implementation does not provide it.
    #[error("operation `{operation}` is not supported by this filter implementation")]
    Unsupported {
        /// Name of the unsupported operation.
        operation: &'static str,
    },
    /// A serialized filter could not be reconstructed.
    #[error("failed to deserialize filter: {0}")]
    Deserialization(String),
}

/// The capability set shared by every filter in this crate.
///
/// `remove` is optional: implementations that cannot support deletion (the
/// [`BloomFilter`]) fall back to the default, which reports
/// [`FilterError::Unsupported`].
pub trait Filter {
    /// Inserts `item` into the filter. Returns `false` if the filter is
    /// saturated and could not accept the item (only possible for
    /// [`CuckooFilter`]; [`BloomFilter::add`] always succeeds).
    fn add(&mut self, item: impl Hash) -> bool;

    /// Indicates whether `item` might be in the filter. Never a false
    /// negative for an item that was added and not subsequently removed.
    fn contains(&self, item: impl Hash) -> bool;

    /// Removes `item` from the filter, if supported.
    fn remove(&mut self, _item: impl Hash) -> Result<bool, FilterError> {
        Err(FilterError::Unsupported { operation: "remove" })
    }

    /// Resets the filter to its empty state, reusing its existing storage.
    fn clear(&mut self);

    /// Returns `true` if the filter holds no elements.
    fn is_empty(&self) -> bool {
        self.len_u64() == 0
    }

    /// Returns the number of elements added, saturating at `u32::MAX`.
    fn len(&self) -> u32 {
        self.len_u64().min(u64::from(u32::MAX)) as u32
    }

    /// Returns the number of elements added, saturating at `u64::MAX`.
    fn len_u64(&self) -> u64;

    /// Returns the capacity the filter was constructed to hold.
    fn capacity(&self) -> u64;

    /// Returns the false-positive probability the filter was constructed to target.
    fn fpp(&self) -> f64;

    /// Returns the filter's current, load-dependent false-positive probability.
    fn current_fpp(&self) -> f64;

    /// Inserts every item of `items`, returning `true` if all were added successfully.
    fn add_all<T: Hash>(&mut self, items: impl IntoIterator<Item = T>) -> bool {
        let mut all_added = true;
        for item in items {
            if !self.add(item) {
                all_added = false;
            }
        }
        all_added
    }

    /// Removes every item of `items`, if supported, returning `true` if all
    /// were found and removed.
    fn remove_all<T: Hash>(
        &mut self,
        items: impl IntoIterator<Item = T>,
    ) -> Result<bool, FilterError> {
        let mut all_removed = true;
        for item in items {
            if !self.remove(item)? {
                all_removed = false;
            }
        }
        Ok(all_removed)
    }

    /// Returns `true` if every item of `items` is (possibly) contained.
    fn contains_all<T: Hash>(&self, items: impl IntoIterator<Item = T>) -> bool {
        items.into_iter().all(|item| self.contains(item))
    }
}

pub mod bloom;
pub mod cuckoo;
mod hash;
mod utils;

pub use bloom::BloomFilter;
pub use cuckoo::CuckooFilter;
