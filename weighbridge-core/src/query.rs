//! Local Query Service State
//!
//! ## Overview
//!
//! [`LocalQuery`] is the shared cell behind the local HTTP endpoint: the
//! cycle commits each reading into it, a query server reads the latest one
//! out, and an exposure flag tells the server whether the endpoint should
//! exist at all (it follows link status - no endpoint while disconnected).
//!
//! Cloning is cheap and shares state, so the cycle and the server each hold
//! their own handle:
//!
//! ```text
//!   MainCycle ──commit──▶ [ Mutex<Option<WeightReading>> ] ──latest──▶ server
//!                         [ AtomicBool exposure          ] ──gate────▶ server
//! ```
//!
//! ## Consistency
//!
//! Readers always see a whole reading or none: the slot swaps under a lock,
//! so a query racing a commit gets the previous committed value, never a
//! half-written one. The cycle is the sole writer (single-writer rule); the
//! exposure flag is written only from the cycle's link evaluation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::reading::{ReadingCell, WeightReading, WeightText, WEIGHT_SENTINEL};

/// Cloneable handle to the committed reading and the exposure gate
#[derive(Debug, Clone, Default)]
pub struct LocalQuery {
    current: Arc<Mutex<Option<WeightReading>>>,
    exposed: Arc<AtomicBool>,
}

impl LocalQuery {
    /// Fresh service: no reading yet, endpoint not exposed
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically replace the current reading
    pub fn commit(&self, reading: WeightReading) {
        *self.current.lock().unwrap() = Some(reading);
    }

    /// Most recently committed reading, if any cycle has completed
    pub fn latest(&self) -> Option<WeightReading> {
        *self.current.lock().unwrap()
    }

    /// Gate the endpoint; follows link status
    pub fn set_exposed(&self, exposed: bool) {
        self.exposed.store(exposed, Ordering::Release);
    }

    /// Whether the endpoint should currently exist
    pub fn is_exposed(&self) -> bool {
        self.exposed.load(Ordering::Acquire)
    }

    /// Response body for a local query: `"12.34"`, or the sentinel before
    /// the first cycle completes
    pub fn response_body(&self) -> WeightText {
        match self.latest() {
            Some(reading) => reading.format(),
            None => {
                let mut text = WeightText::new();
                let _ = text.push_str(WEIGHT_SENTINEL);
                text
            }
        }
    }
}

impl ReadingCell for LocalQuery {
    fn commit(&mut self, reading: WeightReading) {
        LocalQuery::commit(self, reading);
    }

    fn latest(&self) -> Option<WeightReading> {
        LocalQuery::latest(self)
    }

    fn set_exposed(&mut self, exposed: bool) {
        LocalQuery::set_exposed(self, exposed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_before_first_commit() {
        let query = LocalQuery::new();
        assert_eq!(query.latest(), None);
        assert_eq!(query.response_body().as_str(), WEIGHT_SENTINEL);
    }

    #[test]
    fn clones_share_the_committed_reading() {
        let query = LocalQuery::new();
        let reader = query.clone();

        query.commit(WeightReading::new(2.15, 1, 1000));
        let seen = reader.latest().unwrap();
        assert_eq!(seen.value, 2.15);
        assert_eq!(reader.response_body().as_str(), "2.15");
    }

    #[test]
    fn later_commits_supersede() {
        let query = LocalQuery::new();
        query.commit(WeightReading::new(1.0, 1, 1000));
        query.commit(WeightReading::new(2.0, 2, 2000));
        assert_eq!(query.latest().unwrap().cycle, 2);
    }

    #[test]
    fn exposure_defaults_off_and_is_shared() {
        let query = LocalQuery::new();
        let server_side = query.clone();
        assert!(!server_side.is_exposed());

        query.set_exposed(true);
        assert!(server_side.is_exposed());
        query.set_exposed(false);
        assert!(!server_side.is_exposed());
    }

    #[test]
    fn readers_see_whole_readings_under_contention() {
        let query = LocalQuery::new();
        let reader = query.clone();

        let writer = std::thread::spawn(move || {
            for i in 1..=100u32 {
                query.commit(WeightReading::new(i as f32, i, u64::from(i) * 10));
            }
        });

        for _ in 0..100 {
            if let Some(reading) = reader.latest() {
                // Value and cycle id always belong to the same commit
                assert_eq!(reading.value, reading.cycle as f32);
            }
        }
        writer.join().unwrap();
    }
}
