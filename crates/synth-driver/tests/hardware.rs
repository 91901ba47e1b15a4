//! Runs against a real ZedBoard with the synthesizer bitstream loaded

use std::time::Duration;
use synth_driver::{HarnessConfig, Pacing, TestOrchestrator, TestState};

#[test]
#[ignore] // Requires hardware
fn test_program_real_device() {
    let config = HarnessConfig {
        trigger: false,
        ..HarnessConfig::default()
    };
    let mut harness = TestOrchestrator::new(config);

    let report = harness.run().expect("harness run");
    assert_eq!(harness.state(), TestState::Done);
    println!("Mapped {} ({})", report.device_file.display(), report.record);
    println!("Read-back mismatches: {}", report.readback.mismatches.len());
}

#[test]
#[ignore] // Requires hardware and a listener
fn test_trigger_first_voices_quickly() {
    let mut config = HarnessConfig::default();
    config.layout.num_units = 3;
    config.pacing = Pacing {
        gate_on: Duration::from_millis(250),
        gate_off: Duration::from_millis(50),
        ..Pacing::default()
    };
    let mut harness = TestOrchestrator::new(config);

    let report = harness.run().expect("harness run");
    assert_eq!(report.triggered, 3);
}
