//! Basic Weighing Cycle Example
//!
//! This example wires the main cycle entirely out of in-crate test doubles
//! and runs it for a few iterations, printing what each iteration did.
//!
//! ## What You'll Learn
//!
//! - Assembling [`MainCycle`] from its capability seams
//! - How a not-ready sensor skips a cycle without breaking cadence
//! - Where committed readings become visible (display, query, transport)
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_basic_cycle
//! ```

use weighbridge_core::{
    dispatch::RecordingTransport,
    display::RecordingDisplay,
    link::ScriptedLink,
    sample::{ReplaySource, SampleStep},
    time::FixedClock,
    Calibrator, CycleConfig, LocalQuery, MainCycle, WakeCause,
};

fn main() {
    println!("Weighbridge Basic Cycle Example");
    println!("===============================\n");

    // Script the converter: two settling cycles, then a tare baseline and
    // a stream of loaded averages.
    let source = ReplaySource::from_steps(&[
        SampleStep::NotReady,
        SampleStep::NotReady,
        SampleStep::Ready(120), // consumed by the automatic tare
        SampleStep::Ready(124_356),
        SampleStep::Ready(124_410),
        SampleStep::Ready(62_238),
    ]);

    // 28892.07 counts per kilogram is a plausible factor for a 24-bit
    // converter on a 200 kg platform.
    let calibrator = Calibrator::new(weighbridge_core::REFERENCE_SCALE_FACTOR)
        .expect("factor is nonzero");

    let mut cycle = MainCycle::new(
        CycleConfig::default(),
        calibrator,
        source,
        ScriptedLink::up(),
        RecordingDisplay::new(),
        RecordingTransport::new(),
        LocalQuery::new(),
        FixedClock::new(0),
    );
    let query = cycle.reading_cell().clone();

    cycle.startup(WakeCause::PowerOn);

    println!("Running six cycles:\n");
    for _ in 0..6 {
        let report = cycle.run_cycle();
        match report.committed() {
            Some(reading) => println!(
                "  cycle {:2}: link {:?}, committed {} kg, upload {:?}",
                report.iteration,
                report.link,
                reading.format().as_str(),
                report.dispatch.expect("commit always attempts dispatch"),
            ),
            None => println!(
                "  cycle {:2}: link {:?}, skipped (sensor not ready)",
                report.iteration, report.link,
            ),
        }
    }

    println!("\nWhat the outside world saw:");
    println!("  display frames rendered: {}", cycle.display().renders());
    println!("  uploads sent:            {}", cycle.dispatcher().transport().calls());
    println!("  last upload body:        {:?}", cycle.dispatcher().transport().last_body());
    println!("  local query answers:     {}", query.response_body().as_str());

    println!("\n{}", "=".repeat(60));
    println!("Key Insights:");
    println!("- Skipped cycles still sleep, so the cadence never drifts");
    println!("- The first ready batch is spent on the automatic tare");
    println!("- Display, query and transport all read the same committed value");
}
