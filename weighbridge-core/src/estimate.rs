//! Weight Estimation Policy
//!
//! ## Overview
//!
//! One estimator call turns a batch of noisy raw conversions into a single
//! [`WeightReading`]:
//!
//! ```text
//! SampleSource ──batch average──▶ Calibrator ──scale──▶ WeightReading
//! ```
//!
//! Two policies live here and nowhere else:
//!
//! - **Honesty over availability**: if the source has no conversion ready,
//!   [`acquire`](WeightEstimator::acquire) returns
//!   [`ScaleError::SensorNotReady`] instead of a zero or stale value dressed
//!   up as a measurement. Callers must be able to tell "nothing on the
//!   platform" from "sensor unavailable".
//! - **Mandatory averaging**: reported values always come from a batch
//!   (default 10 samples). Single-sample reads smooth nothing and are
//!   reserved for calibration's internal raw-average step.
//!
//! No clamping happens here: an out-of-range physical value passes through
//! unmodified. Range policy, if a deployment wants one, belongs to a layer
//! above the estimator.

use crate::calib::Calibrator;
use crate::errors::{ScaleError, ScaleResult};
use crate::reading::WeightReading;
use crate::sample::SampleSource;
use crate::time::Timestamp;

/// Default batch size for one acquisition
pub const DEFAULT_SAMPLE_COUNT: u32 = 10;

/// Smallest batch that still counts as averaging
pub const MIN_SAMPLE_COUNT: u32 = 2;

/// Produces one calibrated reading per acquisition cycle
///
/// Owns the monotonic cycle counter: every successful acquisition stamps the
/// next id, failed ones consume nothing.
#[derive(Debug, Clone)]
pub struct WeightEstimator {
    next_cycle: u32,
}

impl WeightEstimator {
    pub fn new() -> Self {
        Self { next_cycle: 1 }
    }

    /// Readings produced since construction
    pub fn cycles_produced(&self) -> u32 {
        self.next_cycle - 1
    }

    /// Acquire one averaged, calibrated reading
    ///
    /// Returns [`ScaleError::SensorNotReady`] exactly when the source probe
    /// fails, whatever the batch size. Batch sizes below
    /// [`MIN_SAMPLE_COUNT`] are raised to it.
    pub fn acquire<S: SampleSource>(
        &mut self,
        source: &mut S,
        calibrator: &Calibrator,
        sample_count: u32,
        now: Timestamp,
    ) -> ScaleResult<WeightReading> {
        if !source.is_ready() {
            return Err(ScaleError::SensorNotReady);
        }

        let batch = sample_count.max(MIN_SAMPLE_COUNT);
        let raw = source.read_average(batch)?;
        let value = calibrator.apply(raw)?;

        let reading = WeightReading::new(value, self.next_cycle, now);
        self.next_cycle += 1;
        Ok(reading)
    }
}

impl Default for WeightEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{ConstSource, RawSample};

    struct FaultSource;

    impl SampleSource for FaultSource {
        fn is_ready(&mut self) -> bool {
            true
        }

        fn read_average(&mut self, _count: u32) -> ScaleResult<RawSample> {
            Err(ScaleError::SampleFault { reason: "bus timeout" })
        }
    }

    fn calibrator(factor: f32) -> Calibrator {
        Calibrator::new(factor).unwrap()
    }

    #[test]
    fn not_ready_iff_probe_fails() {
        let mut estimator = WeightEstimator::new();
        let calib = calibrator(2.0);
        let mut source = ConstSource::new(10);

        for count in [0, 1, 10, 100] {
            source.set_ready(false);
            assert_eq!(
                estimator.acquire(&mut source, &calib, count, 0),
                Err(ScaleError::SensorNotReady)
            );

            source.set_ready(true);
            assert!(estimator.acquire(&mut source, &calib, count, 0).is_ok());
        }
    }

    #[test]
    fn calibrates_the_batch_average() {
        let mut estimator = WeightEstimator::new();
        let calib = calibrator(2.0);
        let mut source = ConstSource::new(10);

        let reading = estimator
            .acquire(&mut source, &calib, DEFAULT_SAMPLE_COUNT, 1234)
            .unwrap();
        assert_eq!(reading.value, 5.0);
        assert_eq!(reading.timestamp, 1234);
        assert_eq!(source.last_count(), DEFAULT_SAMPLE_COUNT);
    }

    #[test]
    fn cycle_ids_are_monotonic_and_dense() {
        let mut estimator = WeightEstimator::new();
        let calib = calibrator(2.0);
        let mut source = ConstSource::new(10);

        let first = estimator.acquire(&mut source, &calib, 10, 0).unwrap();
        let second = estimator.acquire(&mut source, &calib, 10, 0).unwrap();
        assert_eq!(first.cycle, 1);
        assert_eq!(second.cycle, 2);
        assert_eq!(estimator.cycles_produced(), 2);
    }

    #[test]
    fn failed_acquisitions_consume_no_cycle_id() {
        let mut estimator = WeightEstimator::new();
        let calib = calibrator(2.0);
        let mut source = ConstSource::new(10);

        source.set_ready(false);
        assert!(estimator.acquire(&mut source, &calib, 10, 0).is_err());
        assert!(estimator.acquire(&mut FaultSource, &calib, 10, 0).is_err());

        source.set_ready(true);
        let reading = estimator.acquire(&mut source, &calib, 10, 0).unwrap();
        assert_eq!(reading.cycle, 1);
    }

    #[test]
    fn sample_faults_propagate() {
        let mut estimator = WeightEstimator::new();
        let calib = calibrator(2.0);

        assert!(matches!(
            estimator.acquire(&mut FaultSource, &calib, 10, 0),
            Err(ScaleError::SampleFault { .. })
        ));
    }

    #[test]
    fn single_sample_batches_are_raised_to_minimum() {
        let mut estimator = WeightEstimator::new();
        let calib = calibrator(2.0);
        let mut source = ConstSource::new(10);

        estimator.acquire(&mut source, &calib, 0, 0).unwrap();
        assert_eq!(source.last_count(), MIN_SAMPLE_COUNT);
        estimator.acquire(&mut source, &calib, 1, 0).unwrap();
        assert_eq!(source.last_count(), MIN_SAMPLE_COUNT);
    }
}
