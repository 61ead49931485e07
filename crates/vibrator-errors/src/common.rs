//! Error classification shared by every vibrator crate.

use core::fmt;

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// The requested capability is not available
    Capability = 0,
    /// Input validation failed
    Validation = 1,
    /// A finite hardware resource ran out
    Resource = 2,
    /// The hardware access layer reported a failure
    Hardware = 3,
    /// Playback was cut short
    Playback = 4,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Capability => write!(f, "Capability"),
            ErrorCategory::Validation => write!(f, "Validation"),
            ErrorCategory::Resource => write!(f, "Resource"),
            ErrorCategory::Hardware => write!(f, "Hardware"),
            ErrorCategory::Playback => write!(f, "Playback"),
        }
    }
}

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, expected during normal operation
    Info = 0,
    /// Warning, may require attention
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, the actuator may be in an unknown state
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Capability.to_string(), "Capability");
        assert_eq!(ErrorCategory::Hardware.to_string(), "Hardware");
        assert_eq!(ErrorCategory::Playback.to_string(), "Playback");
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Critical > ErrorSeverity::Error);
        assert!(ErrorSeverity::Error > ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning > ErrorSeverity::Info);
    }
}
