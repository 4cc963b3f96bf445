//! Calibration Walkthrough Example
//!
//! This example follows the bench procedure an operator performs once per
//! installation: tare the empty platform, place a known reference mass,
//! derive the counts-per-kilogram factor and verify it.
//!
//! ## What You'll Learn
//!
//! - Taring and why it must precede factor derivation
//! - Deriving a scale factor from a known reference mass
//! - Which inputs the calibrator rejects, and that rejection is harmless
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_calibration
//! ```

use weighbridge_core::{
    sample::ReplaySource, Calibrator, ScaleError, REFERENCE_SCALE_FACTOR,
};

fn main() {
    println!("Weighbridge Calibration Example");
    println!("===============================\n");

    // The converter idles around 1840 counts with nothing on the platform
    // and averages 126196 counts with the 4.3 kg reference brick on it.
    let mut adc = ReplaySource::ready_values(&[1_840, 126_196]);

    // Start from the factory default factor.
    let mut calibrator =
        Calibrator::new(REFERENCE_SCALE_FACTOR).expect("factory default is nonzero");
    println!("Factory state: {:?}\n", calibrator.state());

    // Step 1: tare the empty platform.
    let baseline = calibrator.tare(&mut adc, 10).expect("platform settled");
    println!("Step 1: tared, baseline {} counts", baseline);

    // Step 2: derive the factor from the reference mass.
    let state = calibrator
        .calibrate_with_source(&mut adc, 4.3, 10)
        .expect("reference mass accepted");
    println!(
        "Step 2: 4.3 kg reads {} net counts, factor {:.2} counts/kg",
        126_196 - baseline,
        state.scale_factor
    );

    // Step 3: verify by converting the loaded average back.
    let verified = calibrator.apply(126_196).expect("factor is nonzero");
    println!("Step 3: verification reads {:.3} kg\n", verified);

    // Inputs the calibrator refuses, and what it says about them.
    println!("Rejected inputs:");
    let rejections = [
        ("zero reference mass", calibrator.calibrate_against_known_mass(0.0, 50_000)),
        ("negative reference mass", calibrator.calibrate_against_known_mass(-4.3, 50_000)),
        ("zero raw average", calibrator.calibrate_against_known_mass(4.3, 0)),
    ];
    for (label, outcome) in rejections {
        match outcome {
            Err(ScaleError::InvalidCalibrationInput { reason }) => {
                println!("  {:.<28} rejected: {}", label, reason)
            }
            other => println!("  {:.<28} unexpected: {:?}", label, other),
        }
    }
    println!(
        "\nActive state after rejections is untouched: {:?}",
        calibrator.state()
    );

    println!("\n{}", "=".repeat(60));
    println!("Key Insights:");
    println!("- Tare first: the factor divides net counts, not absolute counts");
    println!("- factor = net counts / reference mass, so heavier bricks mean");
    println!("  more counts per kilogram of resolution");
    println!("- Rejected calibrations never corrupt the active factor");
}
