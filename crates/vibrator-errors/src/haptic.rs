//! Top-level haptic error type.

use core::fmt;

use crate::common::{ErrorCategory, ErrorSeverity};

/// Error returned by every fallible vibrator operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HapticError {
    /// The requested capability is not available on this actuator
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// An argument was out of range or the request was malformed
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// A finite hardware resource could not satisfy the request
    #[error("{resource} exhausted: requested {requested}, available {available}")]
    ResourceExhausted {
        /// Name of the exhausted resource
        resource: String,
        /// Amount requested
        requested: usize,
        /// Amount available when the request was made
        available: usize,
    },

    /// A hardware access call failed
    #[error("Hardware I/O failure during {operation}: {message}")]
    HardwareIo {
        /// Operation that was being performed
        operation: String,
        /// Failure reported by the hardware layer
        message: String,
    },

    /// The effect was stopped or preempted before it finished
    #[error("Effect interrupted before completion")]
    Interrupted,
}

impl HapticError {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            HapticError::UnsupportedOperation(_) => ErrorCategory::Capability,
            HapticError::IllegalArgument(_) => ErrorCategory::Validation,
            HapticError::ResourceExhausted { .. } => ErrorCategory::Resource,
            HapticError::HardwareIo { .. } => ErrorCategory::Hardware,
            HapticError::Interrupted => ErrorCategory::Playback,
        }
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HapticError::Interrupted => ErrorSeverity::Info,
            HapticError::UnsupportedOperation(_) => ErrorSeverity::Warning,
            HapticError::IllegalArgument(_) | HapticError::ResourceExhausted { .. } => {
                ErrorSeverity::Error
            }
            HapticError::HardwareIo { .. } => ErrorSeverity::Critical,
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            HapticError::ResourceExhausted { .. } | HapticError::Interrupted
        )
    }

    /// Create an unsupported operation error.
    pub fn unsupported(what: impl Into<String>) -> Self {
        HapticError::UnsupportedOperation(what.into())
    }

    /// Create an illegal argument error.
    pub fn illegal(msg: impl Into<String>) -> Self {
        HapticError::IllegalArgument(msg.into())
    }

    /// Create a hardware failure error.
    pub fn hardware(operation: impl Into<String>, message: impl fmt::Display) -> Self {
        HapticError::HardwareIo {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Create a resource exhausted error.
    pub fn exhausted(resource: impl Into<String>, requested: usize, available: usize) -> Self {
        HapticError::ResourceExhausted {
            resource: resource.into(),
            requested,
            available,
        }
    }
}

/// Extension trait for attributing foreign errors to a hardware operation.
pub trait ResultExt<T> {
    /// Convert any error into [`HapticError::HardwareIo`] tagged with `operation`.
    fn hw_context(self, operation: &str) -> Result<T, HapticError>;
}

impl<T, E: fmt::Display> ResultExt<T> for Result<T, E> {
    fn hw_context(self, operation: &str) -> Result<T, HapticError> {
        self.map_err(|e| HapticError::hardware(operation, e))
    }
}
