//! Property tests for the calibration arithmetic
//!
//! The conversion must invert cleanly for any plausible factor and the
//! guarded operations must leave state untouched when they reject input.

use proptest::prelude::*;

use weighbridge_core::{Calibrator, ScaleError, REFERENCE_SCALE_FACTOR};

proptest! {
    /// A raw count manufactured as `factor * k` converts back to `k`,
    /// up to integer truncation of the count.
    #[test]
    fn apply_inverts_scaling(
        magnitude in 1_000.0f32..100_000.0,
        negative in any::<bool>(),
        k in -50.0f32..50.0,
    ) {
        let factor = if negative { -magnitude } else { magnitude };
        let calibrator = Calibrator::new(factor).unwrap();
        let raw = (factor * k) as i32;
        let weight = calibrator.apply(raw).unwrap();
        prop_assert!((weight - k).abs() < 2e-3, "factor {factor} k {k} gave {weight}");
    }

    /// Deriving a factor from a reference mass and immediately converting
    /// the same average reproduces the mass.
    #[test]
    fn known_mass_round_trips(
        mass in 0.5f32..500.0,
        raw in 10_000i32..5_000_000,
    ) {
        let mut calibrator = Calibrator::new(1.0).unwrap();
        calibrator.calibrate_against_known_mass(mass, raw).unwrap();
        let weight = calibrator.apply(raw).unwrap();
        prop_assert!(((weight - mass) / mass).abs() < 1e-4);
    }

    /// Rejected reference masses never corrupt the active state.
    #[test]
    fn bad_reference_mass_leaves_state_alone(
        mass in -1_000.0f32..=0.0,
        raw in any::<i32>(),
    ) {
        let mut calibrator = Calibrator::new(REFERENCE_SCALE_FACTOR).unwrap();
        let before = calibrator.state();
        let err = calibrator.calibrate_against_known_mass(mass, raw).unwrap_err();
        prop_assert!(matches!(err, ScaleError::InvalidCalibrationInput { .. }), "unexpected error {:?}", err);
        prop_assert_eq!(calibrator.state(), before);
    }
}
