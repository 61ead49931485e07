//! Platform exception codes.
//!
//! Remote callers see a numeric exception code rather than the Rust error,
//! so every [`HapticError`] variant maps to exactly one code.

use core::fmt;

use crate::haptic::HapticError;

/// Binder-style exception code reported to remote callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExceptionCode {
    /// Success
    None = 0,
    /// Argument rejected
    IllegalArgument = -3,
    /// Hardware or playback state prevents completion
    IllegalState = -5,
    /// Capability absent
    UnsupportedOperation = -7,
    /// Service-defined failure
    ServiceSpecific = -8,
}

impl ExceptionCode {
    /// Raw numeric value.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Decode a raw numeric value.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ExceptionCode::None),
            -3 => Some(ExceptionCode::IllegalArgument),
            -5 => Some(ExceptionCode::IllegalState),
            -7 => Some(ExceptionCode::UnsupportedOperation),
            -8 => Some(ExceptionCode::ServiceSpecific),
            _ => None,
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExceptionCode::None => "EX_NONE",
            ExceptionCode::IllegalArgument => "EX_ILLEGAL_ARGUMENT",
            ExceptionCode::IllegalState => "EX_ILLEGAL_STATE",
            ExceptionCode::UnsupportedOperation => "EX_UNSUPPORTED_OPERATION",
            ExceptionCode::ServiceSpecific => "EX_SERVICE_SPECIFIC",
        };
        write!(f, "{name} ({})", self.code())
    }
}

impl HapticError {
    /// Exception code reported for this error.
    pub fn exception_code(&self) -> ExceptionCode {
        match self {
            HapticError::UnsupportedOperation(_) => ExceptionCode::UnsupportedOperation,
            HapticError::IllegalArgument(_) => ExceptionCode::IllegalArgument,
            HapticError::ResourceExhausted { .. } => ExceptionCode::ServiceSpecific,
            HapticError::HardwareIo { .. } | HapticError::Interrupted => {
                ExceptionCode::IllegalState
            }
        }
    }
}

impl From<&HapticError> for ExceptionCode {
    fn from(err: &HapticError) -> Self {
        err.exception_code()
    }
}
