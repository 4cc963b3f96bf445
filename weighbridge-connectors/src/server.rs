//! Local Query Service for the Weighbridge Appliance
//!
//! ## Overview
//!
//! A small embedded HTTP server that answers `GET /` with the latest
//! committed weight as plain text, for anyone on the local network (a
//! phone, a curl one-liner, a kiosk panel). It reads the shared
//! [`LocalQuery`] handle the main cycle commits into.
//!
//! ## Lifecycle
//!
//! The service follows the appliance's connectivity instead of running
//! unconditionally:
//!
//! ```text
//!                  exposure granted
//!    [unbound] ----------------------> [listening]
//!        ^                                  |
//!        |         exposure revoked         |
//!        +----------------------------------+
//! ```
//!
//! While the association is down there is no listener at all, so clients
//! see a refused connection rather than a stale answer. The supervisor
//! task re-checks exposure on a short interval and at every accepted
//! connection, binding and unbinding as the flag moves.
//!
//! ## Example Usage
//!
//! ```no_run
//! use weighbridge_connectors::server::{QueryServer, QueryServerConfig};
//! use weighbridge_core::LocalQuery;
//!
//! #[tokio::main]
//! async fn main() {
//!     let query = LocalQuery::new();
//!     let server = QueryServer::spawn(QueryServerConfig::default(), query.clone());
//!
//!     // The main cycle commits readings and flips exposure from its
//!     // thread; the service binds and unbinds to follow.
//!     query.set_exposed(true);
//!     # drop(server);
//! }
//! ```

use std::future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use weighbridge_core::LocalQuery;

/// Longest a client gets to finish sending its request head
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Query service configuration
#[derive(Debug, Clone)]
pub struct QueryServerConfig {
    /// Address to bind while the service is exposed
    pub addr: SocketAddr,
    /// How often exposure is re-checked
    pub poll_interval: Duration,
}

impl Default for QueryServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 80)),
            poll_interval: Duration::from_millis(200),
        }
    }
}

impl QueryServerConfig {
    /// Create new configuration with the bind address
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            ..Self::default()
        }
    }

    /// Set the exposure re-check interval in milliseconds
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval = Duration::from_millis(ms);
        self
    }
}

/// Handle to the running query service task
///
/// Dropping the handle leaves the task running until the runtime shuts
/// down; call [`QueryServer::shutdown`] for an orderly stop.
pub struct QueryServer {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
    bound: watch::Receiver<Option<SocketAddr>>,
}

impl QueryServer {
    /// Spawn the service onto the current tokio runtime
    pub fn spawn(config: QueryServerConfig, query: LocalQuery) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (bound_tx, bound_rx) = watch::channel(None);
        let handle = tokio::spawn(run(config, query, shutdown_rx, bound_tx));
        Self {
            handle,
            shutdown: shutdown_tx,
            bound: bound_rx,
        }
    }

    /// Address currently bound, if the service is exposed
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.bound.borrow()
    }

    /// Wait until the service binds, returning the bound address
    ///
    /// Returns `None` if the task ended before ever binding.
    pub async fn wait_for_bind(&mut self) -> Option<SocketAddr> {
        loop {
            if let Some(addr) = *self.bound.borrow() {
                return Some(addr);
            }
            if self.bound.changed().await.is_err() {
                return None;
            }
        }
    }

    /// Wait until the service has no listener
    ///
    /// Returns `false` if the task ended first.
    pub async fn wait_for_unbind(&mut self) -> bool {
        loop {
            if self.bound.borrow().is_none() {
                return true;
            }
            if self.bound.changed().await.is_err() {
                return false;
            }
        }
    }

    /// Stop the service and wait for the task to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

/// Supervisor loop: reconcile the listener with the exposure flag, accept
/// while bound, stop on shutdown.
async fn run(
    config: QueryServerConfig,
    query: LocalQuery,
    mut shutdown: watch::Receiver<bool>,
    bound: watch::Sender<Option<SocketAddr>>,
) {
    let mut listener: Option<TcpListener> = None;
    let mut ticker = time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        reconcile(&config, &query, &mut listener, &bound).await;

        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            accepted = accept_one(listener.as_ref()), if listener.is_some() => {
                match accepted {
                    Ok((stream, peer)) => {
                        log::debug!("query client {peer}");
                        tokio::spawn(serve_connection(stream, query.clone()));
                    }
                    Err(err) => log::warn!("query accept failed: {err}"),
                }
            }
        }
    }

    bound.send_replace(None);
}

/// Bring the listener in line with the exposure flag
async fn reconcile(
    config: &QueryServerConfig,
    query: &LocalQuery,
    listener: &mut Option<TcpListener>,
    bound: &watch::Sender<Option<SocketAddr>>,
) {
    match (listener.is_some(), query.is_exposed()) {
        (false, true) => match TcpListener::bind(config.addr).await {
            Ok(new_listener) => {
                let addr = new_listener.local_addr().ok();
                if let Some(addr) = addr {
                    log::info!("query service listening on {addr}");
                }
                *listener = Some(new_listener);
                bound.send_replace(addr);
            }
            // Leave the listener absent; the next tick retries.
            Err(err) => log::warn!("query service bind {} failed: {err}", config.addr),
        },
        (true, false) => {
            log::info!("query service withdrawn");
            *listener = None;
            bound.send_replace(None);
        }
        _ => {}
    }
}

/// Accept on the listener if one exists, otherwise park forever
///
/// The select arm guarding this future never polls it while unbound; the
/// pending branch keeps that safe without an unwrap.
async fn accept_one(listener: Option<&TcpListener>) -> io::Result<(TcpStream, SocketAddr)> {
    match listener {
        Some(listener) => listener.accept().await,
        None => future::pending().await,
    }
}

/// Answer one client and close the connection
async fn serve_connection(mut stream: TcpStream, query: LocalQuery) {
    let head = match time::timeout(REQUEST_TIMEOUT, read_head(&mut stream)).await {
        Ok(Some(head)) => head,
        _ => return,
    };

    let (status, body) = match request_target(&head) {
        Some(("GET", "/")) => ("200 OK", query.response_body().as_str().to_string()),
        Some(("GET", _)) => ("404 Not Found", "not found".to_string()),
        Some(_) => ("405 Method Not Allowed", "method not allowed".to_string()),
        None => ("400 Bad Request", "bad request".to_string()),
    };

    let response = format!(
        "HTTP/1.1 {status}\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Read until the end of the request head or the buffer fills
async fn read_head(stream: &mut TcpStream) -> Option<String> {
    let mut buf = [0u8; 1024];
    let mut filled = 0;
    loop {
        if filled == buf.len() {
            break;
        }
        let n = stream.read(&mut buf[filled..]).await.ok()?;
        if n == 0 {
            break;
        }
        filled += n;
        if buf[..filled].windows(4).any(|window| window == b"\r\n\r\n") {
            break;
        }
    }
    (filled > 0).then(|| String::from_utf8_lossy(&buf[..filled]).into_owned())
}

/// Method and target from the request line
fn request_target(head: &str) -> Option<(&str, &str)> {
    let mut parts = head.lines().next()?.split_whitespace();
    Some((parts.next()?, parts.next()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weighbridge_core::{WeightReading, WEIGHT_SENTINEL};

    const TEST_TIMEOUT: Duration = Duration::from_secs(2);

    fn local_config() -> QueryServerConfig {
        QueryServerConfig::new(SocketAddr::from(([127, 0, 0, 1], 0))).poll_interval_ms(10)
    }

    async fn fetch(addr: SocketAddr, target: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {target} HTTP/1.1\r\nHost: weighbridge\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn answers_current_weight_while_exposed() {
        let query = LocalQuery::new();
        query.commit(WeightReading::new(2.15, 1, 0));
        query.set_exposed(true);

        let mut server = QueryServer::spawn(local_config(), query.clone());
        let addr = time::timeout(TEST_TIMEOUT, server.wait_for_bind())
            .await
            .expect("bind within deadline")
            .expect("task alive");

        let response = fetch(addr, "/").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("text/plain"));
        assert!(response.ends_with("2.15"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn sentinel_before_first_commit() {
        let query = LocalQuery::new();
        query.set_exposed(true);

        let mut server = QueryServer::spawn(local_config(), query.clone());
        let addr = time::timeout(TEST_TIMEOUT, server.wait_for_bind())
            .await
            .expect("bind within deadline")
            .expect("task alive");

        let response = fetch(addr, "/").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with(WEIGHT_SENTINEL));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let query = LocalQuery::new();
        query.set_exposed(true);

        let mut server = QueryServer::spawn(local_config(), query.clone());
        let addr = time::timeout(TEST_TIMEOUT, server.wait_for_bind())
            .await
            .expect("bind within deadline")
            .expect("task alive");

        let response = fetch(addr, "/metrics").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn never_binds_while_unexposed() {
        let query = LocalQuery::new();
        let server = QueryServer::spawn(local_config(), query.clone());

        time::sleep(Duration::from_millis(80)).await;
        assert_eq!(server.local_addr(), None);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn withdraws_when_exposure_revoked() {
        let query = LocalQuery::new();
        query.set_exposed(true);

        let mut server = QueryServer::spawn(local_config(), query.clone());
        let addr = time::timeout(TEST_TIMEOUT, server.wait_for_bind())
            .await
            .expect("bind within deadline")
            .expect("task alive");

        query.set_exposed(false);
        let unbound = time::timeout(TEST_TIMEOUT, server.wait_for_unbind())
            .await
            .expect("unbind within deadline");
        assert!(unbound);
        assert_eq!(server.local_addr(), None);

        // The old address now refuses connections outright.
        assert!(TcpStream::connect(addr).await.is_err());

        server.shutdown().await;
    }
}
