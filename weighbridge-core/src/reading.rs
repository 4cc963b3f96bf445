//! Weight Readings and the Committed-Reading Cell
//!
//! ## Overview
//!
//! A [`WeightReading`] is the unit of truth in the system: one calibrated,
//! averaged value per acquisition cycle, stamped with a monotonic cycle id.
//! Readings are immutable - the next cycle supersedes, never mutates.
//!
//! Exactly one "current" reading exists at any time. The cycle commits it
//! through a [`ReadingCell`], and the display, the query service and the
//! dispatcher all observe that committed value - never an intermediate one.
//! [`ReadingSlot`] is the plain single-threaded cell; the std
//! [`LocalQuery`](crate::query::LocalQuery) handle implements the same seam
//! for concurrent readers.
//!
//! ## Formatting
//!
//! The presentation boundary is exactly two fraction digits (`"12.34"`),
//! both on the local query endpoint and in the outbound report. Internal
//! computation keeps full float precision; formatting happens only at the
//! edges.

use core::fmt::Write as _;

use crate::time::Timestamp;

/// Query/display text shown before the first reading is committed
///
/// Distinguishable from every legitimate two-decimal weight, including zero.
pub const WEIGHT_SENTINEL: &str = "--.--";

/// Buffer type for formatted weights
///
/// 48 bytes covers any `f32` rendered with two fraction digits.
pub type WeightText = heapless::String<48>;

/// One calibrated weight, produced once per acquisition cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightReading {
    /// Calibrated weight in kilograms
    pub value: f32,
    /// Monotonic cycle id; later readings always carry a larger id
    pub cycle: u32,
    /// When the batch was acquired
    pub timestamp: Timestamp,
}

impl WeightReading {
    pub fn new(value: f32, cycle: u32, timestamp: Timestamp) -> Self {
        Self { value, cycle, timestamp }
    }

    /// Presentation form with exactly two fraction digits
    pub fn format(&self) -> WeightText {
        format_weight(self.value)
    }
}

/// Render a weight with exactly two fraction digits
pub fn format_weight(value: f32) -> WeightText {
    let mut text = WeightText::new();
    // Cannot overflow: the widest f32 with two fraction digits is 43 bytes
    let _ = write!(text, "{:.2}", value);
    text
}

/// The commit seam between the cycle and its observers
///
/// The cycle is the sole writer. `set_exposed` follows link status and only
/// matters for cells that back a query endpoint; plain cells ignore it.
pub trait ReadingCell {
    /// Atomically replace the current reading
    fn commit(&mut self, reading: WeightReading);

    /// Most recently committed reading, if any cycle has completed
    fn latest(&self) -> Option<WeightReading>;

    /// Gate the query endpoint on link status
    fn set_exposed(&mut self, exposed: bool) {
        let _ = exposed;
    }
}

/// Plain single-threaded committed-reading cell
///
/// Suitable wherever the reader and the writer share one thread of control.
#[derive(Debug, Clone, Default)]
pub struct ReadingSlot {
    current: Option<WeightReading>,
    commits: u32,
}

impl ReadingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commits observed since construction
    pub fn commits(&self) -> u32 {
        self.commits
    }
}

impl ReadingCell for ReadingSlot {
    fn commit(&mut self, reading: WeightReading) {
        self.current = Some(reading);
        self.commits += 1;
    }

    fn latest(&self) -> Option<WeightReading> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_two_fraction_digits() {
        assert_eq!(format_weight(12.3).as_str(), "12.30");
        assert_eq!(format_weight(0.0).as_str(), "0.00");
        assert_eq!(format_weight(-1.5).as_str(), "-1.50");
        assert_eq!(format_weight(2.151).as_str(), "2.15");
    }

    #[test]
    fn slot_supersedes_prior_reading() {
        let mut slot = ReadingSlot::new();
        assert_eq!(slot.latest(), None);

        slot.commit(WeightReading::new(1.0, 1, 1000));
        slot.commit(WeightReading::new(2.0, 2, 2000));

        let latest = slot.latest().unwrap();
        assert_eq!(latest.value, 2.0);
        assert_eq!(latest.cycle, 2);
        assert_eq!(slot.commits(), 2);
    }

    #[test]
    fn reading_format_matches_free_function() {
        let reading = WeightReading::new(4.3, 7, 0);
        assert_eq!(reading.format().as_str(), "4.30");
    }
}
