//! Range-check helpers.
//!
//! All helpers produce [`HapticError::IllegalArgument`] with a message naming
//! the offending field, so request validation reads as a flat list of checks.

use core::fmt;

use crate::haptic::HapticError;

/// Create an out of range error for a numeric value.
pub fn out_of_range<T: fmt::Debug>(field: &str, value: T, min: T, max: T) -> HapticError {
    HapticError::IllegalArgument(format!(
        "{field} value {value:?} is out of range [{min:?}, {max:?}]"
    ))
}

/// Create an error for a collection holding more entries than allowed.
pub fn too_many(field: &str, actual: usize, max: usize) -> HapticError {
    HapticError::IllegalArgument(format!(
        "{field} has {actual} entries (max: {max})"
    ))
}

/// Check that `value` lies in the inclusive range `[min, max]`.
///
/// NaN never satisfies the range.
pub fn ensure_range<T>(field: &str, value: T, min: T, max: T) -> Result<T, HapticError>
where
    T: PartialOrd + fmt::Debug + Copy,
{
    if value >= min && value <= max {
        Ok(value)
    } else {
        Err(out_of_range(field, value, min, max))
    }
}

/// Check that a collection length is in `[min, max]`.
pub fn ensure_len(field: &str, len: usize, min: usize, max: usize) -> Result<usize, HapticError> {
    if len < min {
        return Err(HapticError::IllegalArgument(format!(
            "{field} has {len} entries (min: {min})"
        )));
    }
    if len > max {
        return Err(too_many(field, len, max));
    }
    Ok(len)
}
