//! Error Types for Acquisition and Calibration Failures
//!
//! ## Design Philosophy
//!
//! Weighbridge's error system is designed with embedded appliances in mind:
//!
//! 1. **Small Size**: Each error variant is kept minimal since errors are
//!    returned on the hot acquisition path once per cycle.
//!
//! 2. **No Heap Allocation**: All error data is inline - no String, only
//!    &'static str for reasons. This ensures deterministic memory usage.
//!
//! 3. **Copy Semantics**: Errors implement Copy for efficient return from
//!    functions without move semantics complications.
//!
//! 4. **Actionable Information**: Each error carries enough context to decide
//!    the cycle-level response (skip, re-prompt the operator, keep prior
//!    state) without further queries.
//!
//! ## Error Categories
//!
//! ### Transient acquisition faults
//! - `SensorNotReady`: the ADC has no conversion available; the cycle is
//!   skipped and retried at the next cadence boundary
//! - `SampleFault`: a bounded raw read failed mid-batch (bus fault, timeout)
//!
//! ### Maintenance (operator) errors
//! - `InvalidCalibrationInput`: bad reference mass or unusable raw average
//!   during the calibration procedure; prior calibration stays in force
//! - `InvalidCalibration`: the division guard - a zero scale factor was about
//!   to be used for conversion
//!
//! Connectivity and dispatch outcomes are deliberately *not* errors: link
//! state lives in [`LinkStatus`](crate::link::LinkStatus) and per-attempt
//! dispatch results in [`DispatchOutcome`](crate::dispatch::DispatchOutcome).
//! Neither aborts the cycle, so neither travels through `Result`.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use weighbridge_core::{Calibrator, ScaleError};
//!
//! fn run_calibration(calibrator: &mut Calibrator, known_mass: f32, raw_average: i32) {
//!     match calibrator.calibrate_against_known_mass(known_mass, raw_average) {
//!         Ok(state) => {
//!             // New factor installed - note it in the site log
//!             let _ = state.scale_factor;
//!         }
//!         Err(ScaleError::InvalidCalibrationInput { .. }) => {
//!             // Operator entered a bad reference - prompt again,
//!             // previous calibration is untouched
//!         }
//!         Err(_) => {
//!             // Anything else also leaves prior calibration in force
//!         }
//!     }
//! }
//! ```
//!
//! ## Memory Layout
//!
//! The largest variants carry a `&'static str` reason:
//! ```text
//! ScaleError size = 24 bytes (64-bit target)
//! ├── Discriminant: 1 byte (padded to 8)
//! └── Largest variant (reason: &'static str): 16 bytes
//! ```

use thiserror_no_std::Error;

/// Result type for acquisition and calibration operations
pub type ScaleResult<T> = Result<T, ScaleError>;

/// Acquisition and calibration errors - kept small for embedded use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ScaleError {
    /// The sample source has no conversion ready; skip this cycle
    #[error("sensor not ready")]
    SensorNotReady,

    /// A bounded raw read failed partway through the batch
    #[error("sample fault: {reason}")]
    SampleFault {
        /// Driver-supplied classification of the fault
        reason: &'static str,
    },

    /// Conversion was attempted with a zero scale factor
    #[error("invalid calibration: scale factor {scale_factor} unusable")]
    InvalidCalibration {
        /// The offending factor (zero or non-finite)
        scale_factor: f32,
    },

    /// The calibration procedure was given unusable inputs
    #[error("invalid calibration input: {reason}")]
    InvalidCalibrationInput {
        /// Which input was rejected and why
        reason: &'static str,
    },
}

impl ScaleError {
    /// Whether this error skips the cycle (retried next cadence boundary)
    /// rather than signalling an operator input problem
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::SensorNotReady | Self::SampleFault { .. })
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ScaleError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::SensorNotReady =>
                defmt::write!(fmt, "sensor not ready"),
            Self::SampleFault { reason } =>
                defmt::write!(fmt, "sample fault: {}", reason),
            Self::InvalidCalibration { scale_factor } =>
                defmt::write!(fmt, "invalid calibration: factor {}", scale_factor),
            Self::InvalidCalibrationInput { reason } =>
                defmt::write!(fmt, "invalid calibration input: {}", reason),
        }
    }
}
