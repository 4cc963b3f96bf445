//! Link Recovery Example
//!
//! This example scripts an association that fails for a while and then
//! comes back, showing how the cycle behaves through the outage: weighing
//! continues, uploads are skipped, and recovery happens at a cycle
//! boundary without any intervention.
//!
//! ## What You'll Learn
//!
//! - The bounded retry budget behind each reconnect round
//! - Why `Failed` is re-evaluated every cycle instead of being terminal
//! - What the dispatch outcome reports during an outage
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 03_link_recovery
//! ```

use weighbridge_core::{
    dispatch::RecordingTransport,
    display::RecordingDisplay,
    link::{RetryPolicy, ScriptedLink},
    sample::ReplaySource,
    time::{Clock, FixedClock},
    Calibrator, CycleConfig, LocalQuery, MainCycle, REFERENCE_SCALE_FACTOR,
};

fn main() {
    println!("Weighbridge Link Recovery Example");
    println!("=================================\n");

    let policy = RetryPolicy::default();
    println!(
        "Retry policy: {} attempts, {} ms apart (worst case {} ms per round)\n",
        policy.max_attempts,
        policy.attempt_delay_ms,
        policy.budget_ms()
    );

    // The access point answers the first round, disappears for two full
    // rounds, then answers again.
    let mut polls = vec![true];
    polls.extend(std::iter::repeat(false).take(2 * policy.max_attempts as usize));
    polls.push(true);
    let link = ScriptedLink::from_polls(&polls, true);

    let mut cycle = MainCycle::new(
        CycleConfig::default(),
        Calibrator::new(REFERENCE_SCALE_FACTOR).expect("factor is nonzero"),
        ReplaySource::ready_values(&[1_840, 126_196]),
        link,
        RecordingDisplay::new(),
        RecordingTransport::new(),
        LocalQuery::new(),
        FixedClock::new(0),
    );
    let query = cycle.reading_cell().clone();

    println!("Running five cycles across the outage:\n");
    for _ in 0..5 {
        let before = cycle.clock().now_ms();
        let report = cycle.run_cycle();
        println!(
            "  cycle {}: link {:?}, upload {:?}, query exposed: {}, spent {} ms",
            report.iteration,
            report.link,
            report.dispatch,
            query.is_exposed(),
            cycle.clock().now_ms() - before,
        );
    }

    let stats = cycle.connectivity().stats();
    println!("\nAssociation stats:");
    println!("  rounds started:      {}", stats.rounds);
    println!("  successful connects: {}", stats.connects);
    println!("  reconnections:       {}", stats.reconnections());

    println!("\n{}", "=".repeat(60));
    println!("Key Insights:");
    println!("- An outage costs at most one retry budget per cycle, then the");
    println!("  appliance moves on and keeps weighing");
    println!("- Uploads report Skipped(LinkDown) rather than failing silently");
    println!("- Recovery needs no special path: the next cycle just tries again");
}
