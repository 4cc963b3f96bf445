//! HTTP Report Upload for the Weighbridge Appliance
//!
//! ## Overview
//!
//! This module delivers committed readings to a collector endpoint as a
//! url-encoded form POST, one request per reading. It implements the
//! core's [`ReportTransport`] seam, so the main cycle never sees socket
//! types; it sees `Sent`, `Failed` or `Skipped` like with any transport.
//!
//! ## Design Decisions
//!
//! ### Why blocking HTTP?
//!
//! The cycle body is synchronous and tolerates a slow upload because the
//! request timeout is far below the cycle interval's usefulness horizon.
//! A blocking [`ureq`] agent keeps the whole report path free of runtime
//! plumbing; the async machinery lives only in the query service.
//!
//! ### One attempt per reading
//!
//! `send_weight` never retries. A fresher reading replaces the payload in
//! about a second, so retrying a stale one is worse than reporting the
//! failure and moving on. The cycle decides what to do with the outcome.
//!
//! ## Example Usage
//!
//! ```no_run
//! use weighbridge_connectors::http::{HttpConfig, HttpReporter};
//! use weighbridge_core::ReportTransport;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpConfig::new("http://collector.local/api/weight")
//!     .timeout_secs(5)
//!     .user_agent("weighbridge-demo/0.1");
//!
//! let mut reporter = HttpReporter::new(config)?;
//! reporter.send_weight("weight=2.15")?;
//! # Ok(())
//! # }
//! ```

use crate::{ConnectionStats, ConnectorError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use weighbridge_core::dispatch::{ReportTransport, TransportFault};

/// HTTP upload configuration
#[derive(Clone)]
pub struct HttpConfig {
    /// Full collector endpoint URL
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl HttpConfig {
    /// Create new configuration with the collector endpoint URL
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(5),
            user_agent: format!("Weighbridge/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set request timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Set the user agent string
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}

/// Report uploader using the lightweight ureq client
pub struct HttpReporter {
    config: HttpConfig,
    agent: ureq::Agent,
    stats: Arc<Mutex<ConnectionStats>>,
}

impl HttpReporter {
    /// Create new report uploader
    pub fn new(config: HttpConfig) -> Result<Self, ConnectorError> {
        // Validate endpoint URL
        if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
            return Err(ConnectorError::ConfigError(
                "Endpoint must start with http:// or https://".into(),
            ));
        }

        // Create ureq agent with configuration
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self {
            config,
            agent,
            stats: Arc::new(Mutex::new(ConnectionStats::default())),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Get transfer statistics
    pub fn stats(&self) -> ConnectionStats {
        self.stats.lock().unwrap().clone()
    }
}

impl ReportTransport for HttpReporter {
    fn send_weight(&mut self, form_body: &str) -> Result<(), TransportFault> {
        let response = self
            .agent
            .post(&self.config.endpoint)
            .set("Content-Type", "application/x-www-form-urlencoded")
            .send_string(form_body);

        let mut stats = self.stats.lock().unwrap();
        match response {
            Ok(_) => {
                stats.reports_sent += 1;
                stats.bytes_sent += form_body.len() as u64;
                Ok(())
            }
            Err(ureq::Error::Status(code, _)) => {
                stats.reports_failed += 1;
                stats.last_error = Some(format!("HTTP {code}"));
                log::warn!("report rejected by {}: HTTP {}", self.config.endpoint, code);
                Err(TransportFault::Status { code })
            }
            Err(ureq::Error::Transport(transport)) => {
                stats.reports_failed += 1;
                stats.last_error = Some(transport.to_string());
                log::warn!("report to {} failed: {}", self.config.endpoint, transport);
                // An io error on an in-flight request is the agent timeout
                // firing; anything before that never reached the host.
                let fault = match transport.kind() {
                    ureq::ErrorKind::Io => TransportFault::Timeout,
                    _ => TransportFault::Unreachable,
                };
                Err(fault)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpListener};
    use std::sync::mpsc;
    use std::thread;

    /// Accept one connection, capture the full request, answer with
    /// `response` and close.
    fn one_shot_server(response: &'static str) -> (SocketAddr, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 2048];
            loop {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let body_len = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            line.to_ascii_lowercase()
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap())
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + body_len {
                        break;
                    }
                }
            }
            stream.write_all(response.as_bytes()).unwrap();
            let _ = stream.flush();
            tx.send(String::from_utf8_lossy(&request).into_owned())
                .unwrap();
        });
        (addr, rx)
    }

    #[test]
    fn test_config_builder() {
        let config = HttpConfig::new("https://collector.example.com/api/weight")
            .timeout_secs(30)
            .user_agent("bench-rig/1.0");

        assert_eq!(config.endpoint, "https://collector.example.com/api/weight");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, "bench-rig/1.0");
    }

    #[test]
    fn test_url_validation() {
        let result = HttpReporter::new(HttpConfig::new("not-a-url"));
        assert!(matches!(result, Err(ConnectorError::ConfigError(_))));

        let result = HttpReporter::new(HttpConfig::new("https://valid.url"));
        assert!(result.is_ok());
    }

    #[test]
    fn delivers_form_encoded_reading() {
        let (addr, request_rx) =
            one_shot_server("HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");

        let config = HttpConfig::new(format!("http://{addr}/api/weight"));
        let mut reporter = HttpReporter::new(config).unwrap();
        reporter.send_weight("weight=2.15").unwrap();

        let request = request_rx.recv().unwrap();
        let lowered = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /api/weight HTTP/1.1"));
        assert!(lowered.contains("content-type: application/x-www-form-urlencoded"));
        assert!(lowered.contains("user-agent: weighbridge/"));
        assert!(request.ends_with("weight=2.15"));

        let stats = reporter.stats();
        assert_eq!(stats.reports_sent, 1);
        assert_eq!(stats.reports_failed, 0);
        assert_eq!(stats.bytes_sent, "weight=2.15".len() as u64);
    }

    #[test]
    fn server_error_maps_to_status_fault() {
        let (addr, _request_rx) = one_shot_server(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );

        let config = HttpConfig::new(format!("http://{addr}/api/weight"));
        let mut reporter = HttpReporter::new(config).unwrap();
        let err = reporter.send_weight("weight=2.15").unwrap_err();

        assert_eq!(err, TransportFault::Status { code: 500 });
        let stats = reporter.stats();
        assert_eq!(stats.reports_failed, 1);
        assert_eq!(stats.last_error.as_deref(), Some("HTTP 500"));
    }

    #[test]
    fn refused_connection_maps_to_unreachable() {
        // Grab a port nobody is listening on by binding and dropping.
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();

        let config = HttpConfig::new(format!("http://{addr}/api/weight"));
        let mut reporter = HttpReporter::new(config).unwrap();
        let err = reporter.send_weight("weight=2.15").unwrap_err();

        assert_eq!(err, TransportFault::Unreachable);
        assert_eq!(reporter.stats().reports_failed, 1);
    }
}
