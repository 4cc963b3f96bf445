//! Shared rig for cycle integration tests
//!
//! Every capability seam is filled with the in-crate doubles so a whole
//! appliance runs deterministically: scripted samples, scripted link,
//! recording display/transport, shared query handle, fixed clock.

#![allow(dead_code)]

use weighbridge_core::{
    dispatch::RecordingTransport,
    display::RecordingDisplay,
    link::ScriptedLink,
    sample::ReplaySource,
    time::FixedClock,
    Calibrator, CycleConfig, LocalQuery, MainCycle,
};

/// Fully scripted appliance
pub type SimCycle = MainCycle<
    ReplaySource,
    ScriptedLink,
    RecordingDisplay,
    RecordingTransport,
    LocalQuery,
    FixedClock,
>;

/// Factor a 4.3 kg reference mass yields from a 100000-count average
pub const BENCH_FACTOR: f32 = 100_000.0 / 4.3;

/// Raw average that weighs ~2.15 kg under [`BENCH_FACTOR`]
pub const RAW_2_15_KG: i32 = 50_000;

pub fn sim_cycle(factor: f32, source: ReplaySource, link: ScriptedLink) -> SimCycle {
    sim_cycle_with_transport(factor, source, link, RecordingTransport::new())
}

pub fn sim_cycle_with_transport(
    factor: f32,
    source: ReplaySource,
    link: ScriptedLink,
    transport: RecordingTransport,
) -> SimCycle {
    MainCycle::new(
        CycleConfig::default(),
        Calibrator::new(factor).expect("nonzero factor"),
        source,
        link,
        RecordingDisplay::new(),
        transport,
        LocalQuery::new(),
        FixedClock::new(0),
    )
}

/// Query handle sharing state with the cycle's cell
pub fn query_handle(cycle: &SimCycle) -> LocalQuery {
    cycle.reading_cell().clone()
}
