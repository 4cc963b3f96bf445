//! Calibration: Raw Counts to Kilograms
//!
//! ## Overview
//!
//! A load cell reports force as raw ADC counts. Two numbers turn counts into
//! kilograms:
//!
//! - **zero offset**: the ambient baseline captured by [`tare`](Calibrator::tare)
//!   with nothing on the platform
//! - **scale factor**: raw counts per kilogram, established once per site by
//!   weighing a known reference mass
//!
//! ```text
//! weight_kg = (raw - zero_offset) / scale_factor
//! ```
//!
//! Both live in [`CalibrationState`], owned exclusively by the [`Calibrator`].
//! The steady-state cycle only ever *reads* calibration; mutation happens in
//! two operator/maintenance paths (tare, calibrate-against-known-mass) and
//! never mid-cycle.
//!
//! ## The division guard
//!
//! A zero scale factor would turn every conversion into a division by zero,
//! so it is rejected at every entrance: constructors refuse it, the
//! calibration procedure refuses inputs that would produce it, and
//! [`apply`](Calibrator::apply) re-checks before dividing. A failed
//! calibration attempt always leaves the previous state in force.
//!
//! ## Sign convention
//!
//! The factor's sign depends on load-cell wiring polarity; negative factors
//! are legitimate and accepted everywhere. Only zero (and non-finite values)
//! are refused.

use crate::errors::{ScaleError, ScaleResult};
use crate::sample::{RawSample, SampleSource};

/// Scale-factor magnitude measured on the reference deployment's load cell
///
/// Sign depends on per-site wiring polarity; always confirm with the
/// calibration procedure before trusting absolute readings.
pub const REFERENCE_SCALE_FACTOR: f32 = 28_892.07;

/// Conversion constants owned by the [`Calibrator`]
///
/// Not persisted across restarts: the factor is re-supplied as configuration
/// on boot and the offset is re-captured by the startup tare.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationState {
    /// Raw counts per kilogram; never zero
    pub scale_factor: f32,
    /// Ambient raw baseline captured by the last tare
    pub zero_offset: RawSample,
}

/// Sole owner and writer of [`CalibrationState`]
#[derive(Debug, Clone)]
pub struct Calibrator {
    state: CalibrationState,
}

impl Calibrator {
    /// Create with a configured scale factor and no baseline yet
    ///
    /// Rejects zero and non-finite factors so an invalid calibrator cannot
    /// be constructed.
    pub fn new(scale_factor: f32) -> ScaleResult<Self> {
        Self::from_state(CalibrationState { scale_factor, zero_offset: 0 })
    }

    /// Restore from a previously captured state (e.g. site configuration)
    pub fn from_state(state: CalibrationState) -> ScaleResult<Self> {
        if state.scale_factor == 0.0 || !state.scale_factor.is_finite() {
            return Err(ScaleError::InvalidCalibration { scale_factor: state.scale_factor });
        }
        Ok(Self { state })
    }

    /// Current calibration constants
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// Convert one raw sample to kilograms
    ///
    /// `(raw - zero_offset) / scale_factor`, guarded against a zero factor.
    pub fn apply(&self, raw: RawSample) -> ScaleResult<f32> {
        let factor = self.state.scale_factor;
        if factor == 0.0 || !factor.is_finite() {
            return Err(ScaleError::InvalidCalibration { scale_factor: factor });
        }
        Ok((raw - self.state.zero_offset) as f32 / factor)
    }

    /// Capture the current ambient baseline as the new zero reference
    ///
    /// Must run once before the first acquisition after a (re)start.
    /// Idempotent: repeated calls re-baseline, they do not accumulate.
    /// Returns the captured baseline for diagnostics.
    pub fn tare<S: SampleSource>(&mut self, source: &mut S, samples: u32) -> ScaleResult<RawSample> {
        if !source.is_ready() {
            return Err(ScaleError::SensorNotReady);
        }
        let baseline = source.read_average(samples)?;
        self.state.zero_offset = baseline;
        Ok(baseline)
    }

    /// Establish the scale factor from a known reference mass
    ///
    /// `raw_average` is tare-relative (baseline already subtracted), exactly
    /// what [`calibrate_with_source`](Self::calibrate_with_source) measures.
    /// Operator-triggered maintenance only - never called from the
    /// steady-state cycle. On any input error the prior state is untouched.
    pub fn calibrate_against_known_mass(
        &mut self,
        known_mass: f32,
        raw_average: RawSample,
    ) -> ScaleResult<CalibrationState> {
        if !(known_mass > 0.0) || !known_mass.is_finite() {
            return Err(ScaleError::InvalidCalibrationInput {
                reason: "known mass must be positive and finite",
            });
        }
        if raw_average == 0 {
            // Accepting this would install a zero factor and defeat the
            // division guard.
            return Err(ScaleError::InvalidCalibrationInput {
                reason: "raw average is zero - is the reference mass on the platform?",
            });
        }
        self.state.scale_factor = raw_average as f32 / known_mass;
        Ok(self.state)
    }

    /// Bench flow: sample the loaded platform, then establish the factor
    ///
    /// Draws an averaged reading with the reference mass in place, subtracts
    /// the current zero offset and delegates to
    /// [`calibrate_against_known_mass`](Self::calibrate_against_known_mass).
    /// This is the one place a raw average is read outside the estimator.
    pub fn calibrate_with_source<S: SampleSource>(
        &mut self,
        source: &mut S,
        known_mass: f32,
        samples: u32,
    ) -> ScaleResult<CalibrationState> {
        if !source.is_ready() {
            return Err(ScaleError::SensorNotReady);
        }
        let loaded = source.read_average(samples)?;
        let tared = loaded - self.state.zero_offset;
        self.calibrate_against_known_mass(known_mass, tared)
    }
}
