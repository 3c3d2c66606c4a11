//! Chooses `(num_buckets, entries_per_bucket, bits_per_entry)` for a
//! requested `(capacity, fpp)`.

use crate::utils::{ceil_div_u64, float_to_u64, next_even};
use crate::FilterError;

/// Smallest false-positive probability this strategy can dimension for:
/// `2 * 8 / 2^64`.
pub(crate) const MIN_FPP: f64 = 2.0 * 8.0 / 18_446_744_073_709_551_616.0;

/// `(entries_per_bucket, target_load)` chosen from the requested `fpp`.
fn bracket(fpp: f64) -> (u8, f64) {
    if fpp <= 1e-5 {
        (8, 0.98)
    } else if fpp <= 2e-3 {
        (4, 0.955)
    } else {
        (2, 0.84)
    }
}

/// Returns `(num_buckets, entries_per_bucket, bits_per_entry)` for a filter
/// meant to hold `capacity` elements at false-positive rate `fpp`.
pub(crate) fn dimension(capacity: u64, fpp: f64) -> Result<(u64, u8, u8), FilterError> {
    if capacity == 0 {
        return Err(FilterError::InvalidArgument {
            argument: "capacity",
            expected: "capacity > 0",
            found: capacity.to_string(),
        });
    }
    if !fpp.is_finite() || fpp < MIN_FPP || fpp >= 1.0 {
        return Err(FilterError::InvalidArgument {
            argument: "fpp",
            expected: "MIN_FPP <= fpp < 1.0",
            found: fpp.to_string(),
        });
    }

    let (entries_per_bucket, target_load) = bracket(fpp);

    let f = (2.0 * f64::from(entries_per_bucket) / fpp).log2().ceil();
    let bits_per_entry = float_to_u64(f, "fpp")
        .ok()
        .filter(|&f| (1..=32).contains(&f))
        .and_then(|f| u8::try_from(f).ok())
        .ok_or_else(|| FilterError::InvalidArgument {
            argument: "fpp",
            expected: "a false-positive rate reachable with bits_per_entry in 1..=32",
            found: fpp.to_string(),
        })?;

    let required_entries = float_to_u64((capacity as f64 / target_load).ceil(), "capacity")?;
    let required_buckets = ceil_div_u64(required_entries, u64::from(entries_per_bucket));
    let num_buckets = next_even(required_buckets).max(2);

    let total_bits = u128::from(num_buckets)
        * u128::from(entries_per_bucket)
        * u128::from(bits_per_entry);
    let word_count = total_bits.div_ceil(64);
    const MAX_WORDS: u128 = 1u128 << 31;
    if word_count > MAX_WORDS {
        return Err(FilterError::InvalidArgument {
            argument: "capacity",
            expected: "a table small enough for one contiguous allocation",
            found: word_count.to_string(),
        });
    }

    Ok((num_buckets, entries_per_bucket, bits_per_entry))
}
