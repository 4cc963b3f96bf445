//! Simulated Appliance Example
//!
//! This example runs the full appliance with real connectors against a
//! scripted load cell: the query service answers on loopback while the
//! upload path posts each committed reading to a collector endpoint.
//!
//! ## What You'll Learn
//!
//! - Wiring [`HttpReporter`] and [`QueryServer`] into the main cycle
//! - How upload failures surface without stopping the appliance
//! - Querying the current weight over plain HTTP while it runs
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example simulated_appliance
//! # in another terminal, while it runs:
//! curl http://127.0.0.1:8080/
//! ```
//!
//! Point `WEIGHBRIDGE_ENDPOINT` at a real collector to see uploads
//! succeed; without one they report `Failed(Unreachable)` and the cycle
//! carries on.

use std::net::SocketAddr;

use weighbridge_connectors::http::{HttpConfig, HttpReporter};
use weighbridge_connectors::server::{QueryServer, QueryServerConfig};
use weighbridge_core::{
    display::{DisplayFrame, DisplaySink},
    link::ScriptedLink,
    sample::ReplaySource,
    time::SystemClock,
    Calibrator, CycleConfig, LocalQuery, MainCycle, WakeCause, REFERENCE_SCALE_FACTOR,
};

/// Stand-in for the appliance's segment display
struct ConsoleDisplay;

impl DisplaySink for ConsoleDisplay {
    fn render(&mut self, frame: &DisplayFrame) {
        println!(
            "  [display] {:>6} kg   link {}",
            frame.weight_text().as_str(),
            if frame.link_ok { "ok" } else { "--" },
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Weighbridge Simulated Appliance");
    println!("===============================\n");

    let endpoint = std::env::var("WEIGHBRIDGE_ENDPOINT")
        .unwrap_or_else(|_| "http://127.0.0.1:9000/api/weight".to_string());
    println!("Uploading to {endpoint} (set WEIGHBRIDGE_ENDPOINT to override)");

    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    let query = LocalQuery::new();
    let server = QueryServer::spawn(
        QueryServerConfig::new(SocketAddr::from(([127, 0, 0, 1], 8080))),
        query.clone(),
    );
    println!("Query service appears on http://127.0.0.1:8080/ once connected\n");

    let reporter = HttpReporter::new(HttpConfig::new(endpoint).timeout_secs(2))?;

    // A platform being loaded and unloaded, as raw converter counts.
    let source = ReplaySource::ready_values(&[1_840, 126_196, 126_240, 63_078, 1_870]);

    let mut cycle = MainCycle::new(
        CycleConfig::default(),
        Calibrator::new(REFERENCE_SCALE_FACTOR)?,
        source,
        ScriptedLink::up(),
        ConsoleDisplay,
        reporter,
        query.clone(),
        SystemClock::default(),
    );
    cycle.startup(WakeCause::PowerOn);

    for _ in 0..5 {
        let report = cycle.run_cycle();
        println!(
            "  cycle {}: link {:?}, upload {:?}",
            report.iteration, report.link, report.dispatch
        );
    }

    println!("\nUpload stats: {:?}", cycle.dispatcher().transport().stats());
    println!("Local answer: {}", query.response_body().as_str());

    runtime.block_on(server.shutdown());
    Ok(())
}
