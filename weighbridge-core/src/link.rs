//! Connectivity State Machine
//!
//! ## Overview
//!
//! The wireless link is unreliable by assumption. This module owns the one
//! place its state is decided:
//!
//! ```text
//!                  start_association / poll ok
//!   ┌──────────────┐     ┌────────────┐      ┌───────────┐
//!   │ Disconnected ├────▶│ Connecting ├─────▶│ Connected │
//!   └──────▲───────┘     └─────┬──────┘      └─────┬─────┘
//!          │                   │ budget            │ association lost
//!          │                   ▼ exhausted         │ (checked every cycle)
//!          │             ┌────────────┐            │
//!          └─────────────┤   Failed   │◀───────────┘ (via Disconnected)
//!       next cycle       └────────────┘
//!       re-enters Connecting
//! ```
//!
//! `Failed` is not absorbing: every cycle boundary re-enters `Connecting`
//! with a fresh bounded budget. Loss of an established association is
//! detected by the per-cycle [`refresh`](ConnectivityManager::refresh) and
//! never triggers an immediate reconnection storm - the next scheduled cycle
//! picks it up, which bounds power and airtime cost.
//!
//! ## Blocking behavior
//!
//! [`reconnect`](ConnectivityManager::reconnect) is one of exactly two
//! intentional blocking points in the whole system (the other is the
//! inter-cycle sleep). It waits at most
//! `max_attempts × attempt_delay_ms` (default 20 × 500 ms ≈ 10 s) and all
//! waiting goes through the [`Clock`] seam, so tests run it instantly.
//!
//! Everything else here is non-blocking: [`status`](ConnectivityManager::status)
//! reports the last-evaluated state without touching the driver.

use crate::time::Clock;
use crate::{log_info, log_warn};

/// Current state of the wireless association
///
/// Owned exclusively by [`ConnectivityManager`]; read-only everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkStatus {
    /// No association; initial state, also entered on detected loss
    Disconnected,
    /// A bounded connection round is in progress
    Connecting,
    /// Association confirmed; dispatch and query exposure enabled
    Connected,
    /// The last connection round exhausted its budget; retried next cycle
    Failed,
}

impl LinkStatus {
    /// Whether the link can carry traffic right now
    pub fn is_up(&self) -> bool {
        matches!(self, LinkStatus::Connected)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LinkStatus {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Disconnected => defmt::write!(fmt, "disconnected"),
            Self::Connecting => defmt::write!(fmt, "connecting"),
            Self::Connected => defmt::write!(fmt, "connected"),
            Self::Failed => defmt::write!(fmt, "failed"),
        }
    }
}

/// Link-layer capability: start an association and report its state
///
/// Implemented by the radio/OS integration (or [`ScriptedLink`] in tests).
/// Both operations must return promptly; all waiting between polls is the
/// manager's job.
pub trait LinkDriver {
    /// Kick off (or re-kick) association; non-blocking
    fn start_association(&mut self);

    /// Whether the link layer currently confirms association
    fn poll_associated(&mut self) -> bool;
}

/// Bounded retry budget for one connection round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryPolicy {
    /// Association polls per round
    pub max_attempts: u32,
    /// Delay between consecutive polls
    pub attempt_delay_ms: u64,
}

impl RetryPolicy {
    /// Approximate worst-case wait for one round
    pub fn budget_ms(&self) -> u64 {
        self.attempt_delay_ms.saturating_mul(self.max_attempts as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // 20 × 500 ms ≈ 10 s ceiling per round
        Self { max_attempts: 20, attempt_delay_ms: 500 }
    }
}

/// Observable connection counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Connection rounds started
    pub rounds: u32,
    /// Polls used by the most recent round
    pub attempts_last_round: u32,
    /// Successful associations (first connect included)
    pub connects: u32,
}

impl LinkStats {
    /// Associations re-established after the first
    pub fn reconnections(&self) -> u32 {
        self.connects.saturating_sub(1)
    }
}

/// Owns the link state machine and the retry policy
pub struct ConnectivityManager<D: LinkDriver> {
    driver: D,
    status: LinkStatus,
    policy: RetryPolicy,
    stats: LinkStats,
}

impl<D: LinkDriver> ConnectivityManager<D> {
    pub fn new(driver: D, policy: RetryPolicy) -> Self {
        Self {
            driver,
            status: LinkStatus::Disconnected,
            policy,
            stats: LinkStats::default(),
        }
    }

    /// Last-evaluated status; non-blocking, no driver interaction
    pub fn status(&self) -> LinkStatus {
        self.status
    }

    /// Counters for logging and diagnostics
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Per-cycle loss check for an established association
    ///
    /// Only downgrades: `Connected` becomes `Disconnected` when the driver
    /// no longer confirms association. Reconnection happens separately at
    /// the cycle boundary via [`reconnect`](Self::reconnect).
    pub fn refresh(&mut self) -> LinkStatus {
        if self.status == LinkStatus::Connected && !self.driver.poll_associated() {
            log_warn!("link: association lost, will reconnect next cycle");
            self.status = LinkStatus::Disconnected;
        }
        self.status
    }

    /// Run one bounded connection round unless already connected
    ///
    /// Blocks for at most the policy budget, sleeping between polls through
    /// `clock`. Ends in `Connected` on the first successful poll, `Failed`
    /// when the budget is exhausted.
    pub fn reconnect<C: Clock>(&mut self, clock: &mut C) -> LinkStatus {
        if self.status == LinkStatus::Connected {
            return self.status;
        }

        self.status = LinkStatus::Connecting;
        self.stats.rounds += 1;
        self.driver.start_association();

        for attempt in 1..=self.policy.max_attempts {
            if self.driver.poll_associated() {
                self.stats.attempts_last_round = attempt;
                self.stats.connects += 1;
                self.status = LinkStatus::Connected;
                log_info!("link: connected after {} attempt(s)", attempt);
                return self.status;
            }
            if attempt < self.policy.max_attempts {
                clock.sleep_ms(self.policy.attempt_delay_ms);
            }
        }

        self.stats.attempts_last_round = self.policy.max_attempts;
        self.status = LinkStatus::Failed;
        log_warn!(
            "link: round failed after {} attempts (~{} ms budget)",
            self.policy.max_attempts,
            self.policy.budget_ms()
        );
        self.status
    }
}

/// Link driver double driven by a poll script
///
/// Scripted outcomes are consumed one per poll; once exhausted every poll
/// returns the steady value, which tests can flip mid-run to simulate a
/// dropped association.
#[derive(Debug, Clone)]
pub struct ScriptedLink {
    script: heapless::Vec<bool, 128>,
    pos: usize,
    steady: bool,
    starts: u32,
    polls: u32,
}

impl ScriptedLink {
    /// Associates on the first poll and stays up
    pub fn up() -> Self {
        Self::from_polls(&[], true)
    }

    /// Never associates
    pub fn down() -> Self {
        Self::from_polls(&[], false)
    }

    /// Explicit poll outcomes, then `steady` forever
    pub fn from_polls(outcomes: &[bool], steady: bool) -> Self {
        let mut script = heapless::Vec::new();
        for o in outcomes {
            let _ = script.push(*o);
        }
        Self { script, pos: 0, steady, starts: 0, polls: 0 }
    }

    /// Change the post-script steady state (e.g. drop the link mid-test)
    pub fn set_steady(&mut self, steady: bool) {
        self.steady = steady;
    }

    pub fn starts(&self) -> u32 {
        self.starts
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }
}

impl LinkDriver for ScriptedLink {
    fn start_association(&mut self) {
        self.starts += 1;
    }

    fn poll_associated(&mut self) -> bool {
        self.polls += 1;
        match self.script.get(self.pos) {
            Some(outcome) => {
                self.pos += 1;
                *outcome
            }
            None => self.steady,
        }
    }
}
