//! Acquisition-calibration-connectivity core for Weighbridge
//!
//! Turns noisy load-cell ADC counts into trustworthy weight readings, keeps
//! an unreliable wireless link alive on a bounded budget, and decides
//! when/how each reading is emitted (display, local query, outbound report)
//! without losing readings or wedging the device.
//!
//! Key constraints:
//! - No heap allocation in the acquisition path (heapless buffers only)
//! - One logical thread of control; blocking happens at exactly two
//!   configured points (inter-cycle sleep, bounded connection round)
//! - Every hardware touchpoint is a swappable capability trait
//!
//! ```
//! use weighbridge_core::{
//!     Calibrator, CycleConfig, MainCycle,
//!     display::NullDisplay,
//!     dispatch::RecordingTransport,
//!     link::ScriptedLink,
//!     reading::ReadingSlot,
//!     sample::ConstSource,
//!     time::FixedClock,
//! };
//!
//! let calibrator = Calibrator::new(28_892.07).unwrap();
//! let mut cycle = MainCycle::new(
//!     CycleConfig::default(),
//!     calibrator,
//!     ConstSource::new(120_000),
//!     ScriptedLink::up(),
//!     NullDisplay,
//!     RecordingTransport::new(),
//!     ReadingSlot::new(),
//!     FixedClock::new(0),
//! );
//!
//! let report = cycle.run_cycle();
//! if let Some(reading) = report.committed() {
//!     let _kg = reading.value;
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Optional logging shims; compile to nothing without the log feature
#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub(crate) use log_debug;
pub(crate) use log_info;
pub(crate) use log_warn;

pub mod calib;
pub mod cycle;
pub mod dispatch;
pub mod display;
pub mod errors;
pub mod estimate;
pub mod link;
#[cfg(feature = "std")]
pub mod query;
pub mod reading;
pub mod sample;
pub mod time;

// Public API
pub use calib::{CalibrationState, Calibrator, REFERENCE_SCALE_FACTOR};
pub use cycle::{CycleConfig, CycleReport, MainCycle, WakeCause};
pub use dispatch::{DispatchOutcome, ReportDispatcher, ReportTransport, SkipReason, TransportFault};
pub use display::{DisplayFrame, DisplaySink};
pub use errors::{ScaleError, ScaleResult};
pub use estimate::{WeightEstimator, DEFAULT_SAMPLE_COUNT};
pub use link::{ConnectivityManager, LinkDriver, LinkStatus, RetryPolicy};
#[cfg(feature = "std")]
pub use query::LocalQuery;
pub use reading::{ReadingCell, WeightReading, WEIGHT_SENTINEL};
pub use sample::{RawSample, SampleSource};
pub use time::{Clock, Timestamp};

/// Crate version, from Cargo metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
