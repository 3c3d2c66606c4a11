use crate::FilterError;

/// Converts a non-negative, finite `f64` to a `u64`, flooring it.
///
/// Used wherever a filter computes a bit size or entry count from a
/// floating-point formula (Bloom's optimal bit size, Cuckoo's required
/// entry count) and must turn it into an integer without silently
/// wrapping on overflow or NaN.
pub(crate) fn float_to_u64(number: f64, argument: &'static str) -> Result<u64, FilterError> {
    if number.is_finite() {
        let floored = number.floor();
        if (0.0..=(u64::MAX as f64)).contains(&floored) {
            Ok(floored as u64)
        } else {
            Err(FilterError::InvalidArgument {
                argument,
                expected: "a value representable as u64",
                found: floored.to_string(),
            })
        }
    } else {
        Err(FilterError::InvalidArgument {
            argument,
            expected: "a finite value",
            found: number.to_string(),
        })
    }
}

/// Ceiling division for non-negative `u64` operands.
pub(crate) fn ceil_div_u64(numerator: u64, denominator: u64) -> u64 {
    debug_assert!(denominator > 0);
    numerator.div_ceil(denominator)
}

/// Rounds `value` up to the next even number (`value` itself if already even).
pub(crate) fn next_even(value: u64) -> u64 {
    value + (value % 2)
}
