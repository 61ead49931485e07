//! Hardware layer errors.

use vibrator_errors::HapticError;

/// Result type for hardware calls.
pub type HwResult<T> = Result<T, HwError>;

/// Failure reported by a hardware access call.
#[derive(Debug, thiserror::Error)]
pub enum HwError {
    /// The underlying device node or sysfs attribute returned an error
    #[error("{operation}: {source}")]
    Io {
        /// Operation being performed
        operation: String,
        /// OS error
        #[source]
        source: std::io::Error,
    },

    /// The driver accepted the call but rejected its contents
    #[error("{operation} rejected: {reason}")]
    Rejected {
        /// Operation being performed
        operation: String,
        /// Reason given by the driver
        reason: String,
    },

    /// The resource behind the call is not present on this device
    #[error("{0} not available")]
    Unavailable(String),
}

impl HwError {
    /// Create an I/O error for `operation`.
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        HwError::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a rejection error for `operation`.
    pub fn rejected(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        HwError::Rejected {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Operation name the error is attributed to.
    pub fn operation(&self) -> &str {
        match self {
            HwError::Io { operation, .. } | HwError::Rejected { operation, .. } => operation,
            HwError::Unavailable(what) => what,
        }
    }
}

impl From<HwError> for HapticError {
    fn from(err: HwError) -> Self {
        let operation = err.operation().to_string();
        let message = match &err {
            HwError::Io { source, .. } => source.to_string(),
            HwError::Rejected { reason, .. } => reason.clone(),
            HwError::Unavailable(_) => "not available".to_string(),
        };
        HapticError::HardwareIo { operation, message }
    }
}
