//! Outbound Report Dispatch
//!
//! ## Overview
//!
//! Once per cycle, after the reading is committed and rendered, the
//! dispatcher offers it to the remote collector. Three rules keep it from
//! ever holding up acquisition:
//!
//! - **Gate first**: with the link anything but `Connected` the dispatcher
//!   returns `Skipped(LinkDown)` without touching the transport at all.
//! - **One attempt per call**: no internal retry loop; the next natural
//!   cycle is the retry. A missed report is dropped, not queued.
//! - **Failure is an observation**: any transport fault maps to
//!   `Failed(fault)` and the loop continues.
//!
//! The wire format is fixed: a url-encoded form with the single field
//! `weight`, two fraction digits (`weight=12.34`). No authentication, no
//! response parsing beyond the status code.

use core::fmt::Write as _;

use thiserror_no_std::Error;

use crate::link::LinkStatus;
use crate::log_warn;
use crate::reading::WeightReading;

/// Form body buffer; `weight=` plus the widest two-decimal f32
pub type FormBody = heapless::String<64>;

/// Why a transport attempt did not succeed
///
/// Connectors classify their library errors into these; full detail is
/// theirs to log at the point of failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFault {
    /// No response within the configured bound
    #[error("transport timeout")]
    Timeout,
    /// Endpoint could not be reached at all
    #[error("collector unreachable")]
    Unreachable,
    /// The collector answered with a non-success status
    #[error("collector returned status {code}")]
    Status {
        /// HTTP status code from the collector
        code: u16,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for TransportFault {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Timeout => defmt::write!(fmt, "timeout"),
            Self::Unreachable => defmt::write!(fmt, "unreachable"),
            Self::Status { code } => defmt::write!(fmt, "status {}", code),
        }
    }
}

/// Why an attempt was skipped without transport I/O
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Link status was not `Connected`
    LinkDown,
}

/// Per-attempt result; transient, observed and dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The collector acknowledged the report
    Sent,
    /// No attempt was made
    Skipped(SkipReason),
    /// The single attempt failed
    Failed(TransportFault),
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent)
    }
}

/// Transport capability for the outbound report
///
/// Takes the pre-formatted form body; implementations own endpoint,
/// timeout and connection handling. One call is one attempt.
pub trait ReportTransport {
    fn send_weight(&mut self, form_body: &str) -> Result<(), TransportFault>;
}

/// Observable dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub sent: u32,
    pub skipped: u32,
    pub failed: u32,
}

/// Gates, formats and forwards one reading per cycle
pub struct ReportDispatcher<T: ReportTransport> {
    transport: T,
    stats: DispatchStats,
}

impl<T: ReportTransport> ReportDispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, stats: DispatchStats::default() }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Offer one committed reading to the collector
    ///
    /// Exactly one transport attempt when `link` is `Connected`, none
    /// otherwise. Never blocks beyond the transport's own bound.
    pub fn dispatch(&mut self, reading: &WeightReading, link: LinkStatus) -> DispatchOutcome {
        if !link.is_up() {
            self.stats.skipped += 1;
            return DispatchOutcome::Skipped(SkipReason::LinkDown);
        }

        let body = form_body(reading);
        match self.transport.send_weight(&body) {
            Ok(()) => {
                self.stats.sent += 1;
                DispatchOutcome::Sent
            }
            Err(fault) => {
                self.stats.failed += 1;
                log_warn!("dispatch: cycle {} report failed: {}", reading.cycle, fault);
                DispatchOutcome::Failed(fault)
            }
        }
    }
}

/// Url-encoded form body for one reading: `weight=<two decimals>`
pub fn form_body(reading: &WeightReading) -> FormBody {
    let mut body = FormBody::new();
    // Cannot overflow: 7 bytes of key plus at most 43 of value
    let _ = write!(body, "weight={:.2}", reading.value);
    body
}

/// Transport double that records bodies and serves a scripted result
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    result: Result<(), TransportFault>,
    calls: u32,
    bodies: heapless::Vec<FormBody, 32>,
}

impl RecordingTransport {
    /// Every attempt succeeds
    pub fn new() -> Self {
        Self { result: Ok(()), calls: 0, bodies: heapless::Vec::new() }
    }

    /// Every attempt fails with `fault`
    pub fn failing(fault: TransportFault) -> Self {
        Self { result: Err(fault), calls: 0, bodies: heapless::Vec::new() }
    }

    /// Change the scripted result mid-test
    pub fn set_result(&mut self, result: Result<(), TransportFault>) {
        self.result = result;
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }

    pub fn bodies(&self) -> &[FormBody] {
        &self.bodies
    }

    pub fn last_body(&self) -> Option<&str> {
        self.bodies.last().map(|b| b.as_str())
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportTransport for RecordingTransport {
    fn send_weight(&mut self, form_body: &str) -> Result<(), TransportFault> {
        self.calls += 1;
        let mut body = FormBody::new();
        let _ = body.push_str(form_body);
        let _ = self.bodies.push(body);
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(value: f32) -> WeightReading {
        WeightReading::new(value, 1, 1000)
    }

    #[test]
    fn skips_without_transport_io_while_link_down() {
        let mut dispatcher = ReportDispatcher::new(RecordingTransport::new());

        for status in [LinkStatus::Disconnected, LinkStatus::Connecting, LinkStatus::Failed] {
            let outcome = dispatcher.dispatch(&reading(2.15), status);
            assert_eq!(outcome, DispatchOutcome::Skipped(SkipReason::LinkDown));
        }
        assert_eq!(dispatcher.transport().calls(), 0);
        assert_eq!(dispatcher.stats().skipped, 3);
    }

    #[test]
    fn sends_exactly_one_attempt_when_connected() {
        let mut dispatcher = ReportDispatcher::new(RecordingTransport::new());

        let outcome = dispatcher.dispatch(&reading(2.15), LinkStatus::Connected);
        assert!(outcome.is_sent());
        assert_eq!(dispatcher.transport().calls(), 1);
        assert_eq!(dispatcher.transport().last_body(), Some("weight=2.15"));
    }

    #[test]
    fn failure_is_observed_not_retried() {
        let mut dispatcher =
            ReportDispatcher::new(RecordingTransport::failing(TransportFault::Timeout));

        let outcome = dispatcher.dispatch(&reading(2.15), LinkStatus::Connected);
        assert_eq!(outcome, DispatchOutcome::Failed(TransportFault::Timeout));
        // One attempt only; the next cycle is the retry
        assert_eq!(dispatcher.transport().calls(), 1);
        assert_eq!(dispatcher.stats().failed, 1);
    }

    #[test]
    fn form_body_has_two_fraction_digits() {
        assert_eq!(form_body(&reading(12.3)).as_str(), "weight=12.30");
        assert_eq!(form_body(&reading(-1.5)).as_str(), "weight=-1.50");
        assert_eq!(form_body(&reading(0.0)).as_str(), "weight=0.00");
    }
}
