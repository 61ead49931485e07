//! Actuator calibration resolution
//!
//! Reads the persisted calibration store once per actuator, validates it and
//! pushes the physical constants down to the driver.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod profile;
pub mod types;

pub use profile::*;
pub use types::*;

use thiserror::Error;
use vibrator_errors::HapticError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("Required calibration value '{0}' is missing")]
    Missing(&'static str),

    #[error("Calibration value '{field}' is malformed: {reason}")]
    Malformed { field: &'static str, reason: String },

    #[error("Volume table '{field}' [{min}, {max}] is invalid")]
    InvalidVolLevels {
        field: &'static str,
        min: u32,
        max: u32,
    },
}

pub type CalibrationResult<T> = Result<T, CalibrationError>;

impl From<CalibrationError> for HapticError {
    fn from(err: CalibrationError) -> Self {
        match err {
            CalibrationError::Missing(field) => HapticError::HardwareIo {
                operation: format!("calibration {field}"),
                message: "missing".to_string(),
            },
            other => HapticError::IllegalArgument(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        let err = CalibrationError::Missing("f0");
        assert_eq!(format!("{}", err), "Required calibration value 'f0' is missing");

        let err = CalibrationError::InvalidVolLevels {
            field: "click",
            min: 80,
            max: 20,
        };
        assert_eq!(format!("{}", err), "Volume table 'click' [80, 20] is invalid");
    }

    #[test]
    fn test_missing_maps_to_hardware_io() {
        let err = HapticError::from(CalibrationError::Missing("redc"));
        assert_eq!(
            err,
            HapticError::HardwareIo {
                operation: "calibration redc".into(),
                message: "missing".into(),
            }
        );
    }
}
