//! Property-based tests for validation helpers.

use proptest::prelude::*;
use vibrator_errors::prelude::*;

proptest! {
    #[test]
    fn test_ensure_range_accepts_exactly_the_range(value in -2.0f32..3.0f32) {
        let result = ensure_range("amplitude", value, 0.0, 1.0);
        prop_assert_eq!(result.is_ok(), (0.0..=1.0).contains(&value));
    }

    #[test]
    fn test_ensure_len_bounds(len in 0usize..400) {
        let result = ensure_len("composite", len, 1, 254);
        prop_assert_eq!(result.is_ok(), (1..=254).contains(&len));
        if let Err(err) = result {
            prop_assert_eq!(err.exception_code(), ExceptionCode::IllegalArgument);
        }
    }

    #[test]
    fn test_exhausted_message_contains_amounts(requested in 0usize..100_000, available in 0usize..100_000) {
        let msg = HapticError::exhausted("owt", requested, available).to_string();
        prop_assert!(msg.contains(&requested.to_string()));
        prop_assert!(msg.contains(&available.to_string()));
    }

    #[test]
    fn test_exception_code_roundtrip(code in -10i32..=1) {
        if let Some(ex) = ExceptionCode::from_code(code) {
            prop_assert_eq!(ex.code(), code);
        }
    }
}
