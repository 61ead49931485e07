//! Prelude module for convenient error handling imports.
//!
//! ```
//! use vibrator_errors::prelude::*;
//!
//! fn check_scale(scale: f32) -> Result<f32> {
//!     validate_range!("scale", scale, 0.0, 1.0);
//!     Ok(scale)
//! }
//!
//! assert!(check_scale(1.5).is_err());
//! ```

pub use crate::{
    Result,
    common::{ErrorCategory, ErrorSeverity},
    haptic::{HapticError, ResultExt},
    status::ExceptionCode,
    validation::{ensure_len, ensure_range, out_of_range, too_many},
};

pub use crate::validate_range;

/// Return early with an out of range error unless `$value` is in `[$min, $max]`.
#[macro_export]
macro_rules! validate_range {
    ($field:expr, $value:expr, $min:expr, $max:expr) => {
        if !($value >= $min && $value <= $max) {
            return Err($crate::validation::out_of_range($field, $value, $min, $max).into());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range_macro() {
        fn test_fn(value: f32) -> Result<()> {
            validate_range!("amplitude", value, 0.0_f32, 1.0_f32);
            Ok(())
        }
        assert!(test_fn(0.5).is_ok());
        assert!(test_fn(1.5).is_err());
        assert!(test_fn(f32::NAN).is_err());
    }
}
