//! Network Connectors for the Weighbridge Appliance
//!
//! ## Overview
//!
//! This crate holds the two network-facing pieces of the appliance, kept
//! out of `weighbridge-core` so the measurement pipeline stays free of
//! socket types and runtimes:
//!
//! - **Report upload** ([`http`]): a blocking HTTP POST of each committed
//!   reading, implementing the core's `ReportTransport` seam.
//! - **Local query service** ([`server`]): a small embedded HTTP server
//!   answering the current weight on the local network, bound only while
//!   the appliance considers itself connected.
//!
//! ## Design Notes
//!
//! ### One attempt per reading
//!
//! The upload path makes exactly one request per committed reading and
//! reports the outcome. Retry cadence belongs to the main cycle: the next
//! reading arrives in about a second anyway, so a stale retry would only
//! compete with fresher data for the same link.
//!
//! ### Bind-on-activate
//!
//! The query service does not filter requests while offline; it does not
//! listen at all. The listener is created when the appliance becomes
//! connected and dropped when the association is lost, so an unreachable
//! appliance refuses connections instead of serving stale answers.
//!
//! ## Example Usage
//!
//! ```no_run
//! use weighbridge_connectors::http::{HttpConfig, HttpReporter};
//! use weighbridge_core::{ReportTransport, WeightReading};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpConfig::new("http://collector.local/api/weight")
//!     .timeout_secs(5);
//! let mut reporter = HttpReporter::new(config)?;
//!
//! let reading = WeightReading::new(2.15, 1, 0);
//! let body = weighbridge_core::dispatch::form_body(&reading);
//! reporter.send_weight(body.as_str())?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "query-server")]
pub mod server;

// Re-export common types
#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpReporter};

#[cfg(feature = "query-server")]
pub use server::{QueryServer, QueryServerConfig};

#[cfg(feature = "std")]
use thiserror::Error;

/// Common connector errors
#[cfg(feature = "std")]
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Rejected configuration, with the reason
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Transfer statistics common to all connectors
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    /// Total reports delivered successfully
    pub reports_sent: u64,
    /// Total reports that failed to deliver
    pub reports_failed: u64,
    /// Total body bytes sent
    pub bytes_sent: u64,
    /// Last error message
    pub last_error: Option<String>,
}
