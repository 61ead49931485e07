//! Loading and applying calibration profiles against the fake store.

use vibrator_calibration::{ActuatorRole, CalibrationError, CalibrationProfile, VolLevels};
use vibrator_errors::HapticError;
use vibrator_test_helpers::prelude::*;

#[test]
fn test_load_full_profile() -> TestResult {
    let profile = CalibrationProfile::load(&FakeHwCal::calibrated(), ActuatorRole::Primary)?;
    assert!((profile.resonant_frequency_hz() - 160.0).abs() < 1e-3);
    assert!((profile.q_factor() - 20.0).abs() < 1e-3);
    assert_eq!(profile.click, VolLevels { min: 20, max: 60 });
    assert_eq!(profile.version, 2);
    assert!(profile.frequency_map().is_some());
    Ok(())
}

#[test]
fn test_optional_values_default() -> TestResult {
    let profile = CalibrationProfile::load(&FakeHwCal::minimal(), ActuatorRole::Primary)?;
    assert_eq!(profile.version, 0);
    assert_eq!(profile.frequency_offset, 0);
    assert_eq!(profile.supported_primitives, None);
    assert!(!profile.chirp_enabled);
    assert!(!profile.f0_comp_enabled);
    assert!(profile.frequency_map().is_none());
    Ok(())
}

#[test]
fn test_zero_primitive_mask_means_all() -> TestResult {
    let cal = FakeHwCal::calibrated().with_supported_primitives(0);
    let profile = CalibrationProfile::load(&cal, ActuatorRole::Primary)?;
    assert_eq!(profile.supported_primitives, None);
    Ok(())
}

#[test]
fn test_missing_required_value_fails_fast() {
    let mut cal = FakeHwCal::calibrated();
    cal.q = None;
    let err = CalibrationProfile::load(&cal, ActuatorRole::Primary);
    assert_eq!(err, Err(CalibrationError::Missing("q")));

    let mut cal = FakeHwCal::calibrated();
    cal.long_vol_levels = None;
    let err = CalibrationProfile::load(&cal, ActuatorRole::Primary).map_err(HapticError::from);
    assert!(matches!(err, Err(HapticError::HardwareIo { .. })));
}

#[test]
fn test_malformed_values_are_illegal_arguments() {
    let mut cal = FakeHwCal::calibrated();
    cal.f0 = Some("not-hex".to_string());
    let err = CalibrationProfile::load(&cal, ActuatorRole::Primary).map_err(HapticError::from);
    assert!(matches!(err, Err(HapticError::IllegalArgument(_))));

    let cal = FakeHwCal::calibrated().with_click(70, 40);
    let err = CalibrationProfile::load(&cal, ActuatorRole::Primary).map_err(HapticError::from);
    assert!(matches!(err, Err(HapticError::IllegalArgument(_))));
}

#[test]
fn test_primary_uses_long_frequency_shift() -> TestResult {
    let cal = FakeHwCal::calibrated()
        .with_long_frequency_shift(-3)
        .with_f0_sync_offset(77);
    let primary = CalibrationProfile::load(&cal, ActuatorRole::Primary)?;
    assert_eq!(primary.frequency_offset, (1 << 24) - (3 << 14));

    let secondary = CalibrationProfile::load(&cal, ActuatorRole::Secondary)?;
    assert_eq!(secondary.frequency_offset, 77);
    Ok(())
}

#[test]
fn test_apply_pushes_constants() -> TestResult {
    let api = FakeHwApi::new();
    let profile = CalibrationProfile::load(&FakeHwCal::calibrated(), ActuatorRole::Primary)?;
    profile.apply(&api, 8500)?;
    assert_eq!(
        api.calls(),
        vec![
            HwCall::SetF0("0x280000".into()),
            HwCall::SetRedc("0x5a00".into()),
            HwCall::SetQ("0x140000".into()),
            HwCall::SetF0CompEnable(true),
            HwCall::SetRedcCompEnable(true),
            HwCall::SetMinOnOffInterval(8500),
        ]
    );
    Ok(())
}

#[test]
fn test_apply_surfaces_hardware_failure() -> TestResult {
    let api = FakeHwApi::new();
    api.fail_on("set_q");
    let profile = CalibrationProfile::load(&FakeHwCal::calibrated(), ActuatorRole::Primary)?;
    let err = profile.apply(&api, 8500);
    assert!(matches!(err, Err(HapticError::HardwareIo { .. })));
    Ok(())
}
