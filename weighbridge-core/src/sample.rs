//! Sample Source Abstraction
//!
//! ## Overview
//!
//! The load-cell ADC is an external collaborator: the core never touches the
//! bus. Everything it needs is behind [`SampleSource`]:
//!
//! - A readiness probe, so "no conversion available" is distinguishable from
//!   "the weight happens to be zero"
//! - A bounded averaged read, because single-sample reads are too noisy for
//!   reported values
//!
//! Hardware crates (HX711 and friends) implement this trait in the firmware
//! layer; the doubles in this module ([`ConstSource`], [`ReplaySource`]) let
//! the whole acquisition loop run hardware-free in tests and examples.
//!
//! ## Contract
//!
//! Both operations must be non-blocking or bounded. A driver that cannot
//! complete a read within its own bound reports [`ScaleError::SampleFault`]
//! rather than hanging the cycle.

use crate::errors::{ScaleError, ScaleResult};

/// One averaged ADC conversion in raw counts
///
/// Signed; 24-bit converter words fit comfortably. Ephemeral - produced by a
/// [`SampleSource`], consumed immediately by calibration.
pub type RawSample = i32;

/// Abstraction over the load-cell ADC
pub trait SampleSource {
    /// Whether a conversion can be read right now
    fn is_ready(&mut self) -> bool;

    /// Average of `count` raw conversions
    ///
    /// Callers have already checked [`is_ready`](Self::is_ready); drivers may
    /// still fail mid-batch and report a [`ScaleError::SampleFault`].
    fn read_average(&mut self, count: u32) -> ScaleResult<RawSample>;
}

/// Source that always returns a fixed raw value
///
/// The simplest double: readiness and value are plain fields, mutable from
/// the test body between cycles.
#[derive(Debug, Clone)]
pub struct ConstSource {
    value: RawSample,
    ready: bool,
    reads: u32,
    last_count: u32,
}

impl ConstSource {
    pub fn new(value: RawSample) -> Self {
        Self { value, ready: true, reads: 0, last_count: 0 }
    }

    pub fn set_value(&mut self, value: RawSample) {
        self.value = value;
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Number of averaged reads served so far
    pub fn reads(&self) -> u32 {
        self.reads
    }

    /// Batch size requested by the most recent read
    pub fn last_count(&self) -> u32 {
        self.last_count
    }
}

impl SampleSource for ConstSource {
    fn is_ready(&mut self) -> bool {
        self.ready
    }

    fn read_average(&mut self, count: u32) -> ScaleResult<RawSample> {
        if !self.ready {
            return Err(ScaleError::SensorNotReady);
        }
        self.reads += 1;
        self.last_count = count;
        Ok(self.value)
    }
}

/// One step of a [`ReplaySource`] script
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleStep {
    /// The probe fails this time; the step is consumed by the probe
    NotReady,
    /// An averaged read returning this raw value
    Ready(RawSample),
}

/// Source that replays a script of readiness probes and raw values
///
/// Advancement rules keep one script step per observable event:
/// - A `NotReady` step is consumed by the readiness probe that sees it
/// - A `Ready` step is consumed by the averaged read (probes peek it)
/// - When the script is exhausted the source stays ready and repeats the
///   last scripted value
#[derive(Debug, Clone)]
pub struct ReplaySource {
    script: heapless::Vec<SampleStep, 64>,
    pos: usize,
    last: RawSample,
}

impl ReplaySource {
    /// Build from an explicit step script
    pub fn from_steps(steps: &[SampleStep]) -> Self {
        let mut script = heapless::Vec::new();
        for step in steps {
            // Capacity 64 is far beyond any scripted scenario; extra steps
            // are dropped rather than panicking in a test double.
            let _ = script.push(*step);
        }
        Self { script, pos: 0, last: 0 }
    }

    /// Build a script that is always ready and serves `values` in order
    pub fn ready_values(values: &[RawSample]) -> Self {
        let mut script = heapless::Vec::new();
        for v in values {
            let _ = script.push(SampleStep::Ready(*v));
        }
        Self { script, pos: 0, last: 0 }
    }

    fn current(&self) -> Option<SampleStep> {
        self.script.get(self.pos).copied()
    }
}

impl SampleSource for ReplaySource {
    fn is_ready(&mut self) -> bool {
        match self.current() {
            Some(SampleStep::NotReady) => {
                self.pos += 1;
                false
            }
            Some(SampleStep::Ready(_)) | None => true,
        }
    }

    fn read_average(&mut self, _count: u32) -> ScaleResult<RawSample> {
        match self.current() {
            Some(SampleStep::NotReady) => {
                self.pos += 1;
                Err(ScaleError::SensorNotReady)
            }
            Some(SampleStep::Ready(v)) => {
                self.pos += 1;
                self.last = v;
                Ok(v)
            }
            None => Ok(self.last),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_source_counts_reads() {
        let mut source = ConstSource::new(1200);
        assert!(source.is_ready());
        assert_eq!(source.read_average(10), Ok(1200));
        assert_eq!(source.read_average(10), Ok(1200));
        assert_eq!(source.reads(), 2);
    }

    #[test]
    fn const_source_not_ready() {
        let mut source = ConstSource::new(1200);
        source.set_ready(false);
        assert!(!source.is_ready());
        assert_eq!(source.read_average(10), Err(ScaleError::SensorNotReady));
    }

    #[test]
    fn replay_consumes_not_ready_on_probe() {
        let mut source = ReplaySource::from_steps(&[
            SampleStep::NotReady,
            SampleStep::NotReady,
            SampleStep::Ready(500),
        ]);

        assert!(!source.is_ready());
        assert!(!source.is_ready());
        assert!(source.is_ready());
        // Ready steps are peeked by probes, consumed by reads
        assert!(source.is_ready());
        assert_eq!(source.read_average(10), Ok(500));
    }

    #[test]
    fn replay_repeats_last_value_when_exhausted() {
        let mut source = ReplaySource::ready_values(&[100, 200]);
        assert_eq!(source.read_average(10), Ok(100));
        assert_eq!(source.read_average(10), Ok(200));
        assert!(source.is_ready());
        assert_eq!(source.read_average(10), Ok(200));
    }
}
