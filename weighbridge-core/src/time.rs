//! Time and cadence for the acquisition loop
//!
//! Provides a clock abstraction so the loop can run against:
//! - The host monotonic clock (when std is available)
//! - A hardware timer on embedded targets
//! - A fixed, manually advanced clock in tests

/// Timestamp in milliseconds since device boot (monotonic)
pub type Timestamp = u64;

/// Source of time and sleep for the acquisition loop
///
/// Sleeping goes through the same seam as reading time so the whole
/// cycle cadence is deterministic under test.
pub trait Clock {
    /// Current timestamp in milliseconds
    fn now_ms(&self) -> Timestamp;

    /// Block for `ms` milliseconds (the inter-cycle and retry waits)
    fn sleep_ms(&mut self, ms: u64);

    /// Milliseconds elapsed since `earlier`
    fn ms_since(&self, earlier: Timestamp) -> u64 {
        self.now_ms().saturating_sub(earlier)
    }
}

/// Host clock backed by `std::time::Instant`
///
/// Starts at 0 on construction, always increases.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemClock {
    pub fn new() -> Self {
        Self { start: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now_ms(&self) -> Timestamp {
        self.start.elapsed().as_millis() as Timestamp
    }

    fn sleep_ms(&mut self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}

/// Fixed clock for testing
///
/// `sleep_ms` advances the clock instead of blocking, so retry budgets
/// and cycle cadence run instantly and deterministically.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Timestamp,
    sleeps: u32,
    slept_ms: u64,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self { now, sleeps: 0, slept_ms: 0 }
    }

    pub fn set(&mut self, now: Timestamp) {
        self.now = now;
    }

    pub fn advance(&mut self, ms: u64) {
        self.now += ms;
    }

    /// Number of sleep calls observed
    pub fn sleeps(&self) -> u32 {
        self.sleeps
    }

    /// Total milliseconds slept
    pub fn slept_ms(&self) -> u64 {
        self.slept_ms
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> Timestamp {
        self.now
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.now += ms;
        self.sleeps += 1;
        self.slept_ms += ms;
    }
}
