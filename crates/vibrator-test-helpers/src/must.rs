//! Unwrap helpers with good error messages.
//!
//! These helpers replace `unwrap()` and `expect()` in test code, providing
//! better error messages with `#[track_caller]` for accurate panic locations.

use std::fmt::Debug;
use std::time::Duration;

/// Unwrap a `Result`, panicking with context on error.
///
/// ```rust
/// use vibrator_test_helpers::must;
///
/// let result: Result<i32, &str> = Ok(42);
/// assert_eq!(must(result), 42);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`, with a message including the error value.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with a custom message if `None`.
///
/// # Panics
///
/// Panics if the option is `None`, with the provided message.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Unwrap a `Result` with additional context in the panic message.
///
/// # Panics
///
/// Panics if the result is `Err`.
#[track_caller]
pub fn must_with<T, E: Debug>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("{context}: {e:?}"),
    }
}

/// Poll `condition` every millisecond until it holds or `timeout` elapses.
///
/// Returns whether the condition was observed.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if std::time::Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_must_ok() {
        let result: Result<i32, &str> = Ok(42);
        assert_eq!(must(result), 42);
    }

    #[test]
    #[should_panic(expected = "must: unexpected Err")]
    fn test_must_err() {
        let result: Result<i32, &str> = Err("boom");
        must(result);
    }

    #[test]
    fn test_must_some() {
        assert_eq!(must_some(Some(7), "value"), 7);
    }

    #[test]
    fn test_wait_until() {
        assert!(wait_until(Duration::from_millis(5), || true));
        assert!(!wait_until(Duration::from_millis(5), || false));
    }
}
