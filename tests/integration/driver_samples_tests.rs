//! Driver samples end to end: button key events, temperature polling and
//! the segment display.

use crate::mock_hw::RecordingKeySink;

use pio_samples::adapters::sim::{SimOp, SimOpKind, SimPeripherals};
use pio_samples::app::driver_samples::{
    ButtonSample, KEYCODE_A, SegmentDisplaySample, TemperatureSample,
};
use pio_samples::app::ports::{KeyAction, KeyEvent};
use pio_samples::{Board, ConfigError, IoError, Sample, SampleConfig, Scheduler};

// ── Button → key events ───────────────────────────────────────

#[test]
fn button_press_and_release_emit_key_events() {
    let sim = SimPeripherals::new();
    let sink = RecordingKeySink::new();
    let mut sched = Scheduler::new();
    let mut sample = ButtonSample::new(Board::Rpi3, sim.clone(), sink.clone());
    sample.initialize(&mut sched).unwrap();
    assert!(sample.is_registered());

    sim.drive_input("BCM21", true);
    assert!(sample.is_pressed());
    sim.drive_input("BCM21", false);

    assert_eq!(
        sink.events(),
        vec![
            KeyEvent {
                code: KEYCODE_A,
                action: KeyAction::Down,
            },
            KeyEvent {
                code: KEYCODE_A,
                action: KeyAction::Up,
            },
        ]
    );
}

#[test]
fn closed_button_emits_nothing() {
    let sim = SimPeripherals::new();
    let sink = RecordingKeySink::new();
    let mut sched = Scheduler::new();
    let mut sample = ButtonSample::new(Board::Imx6ulPico, sim.clone(), sink.clone());
    sample.initialize(&mut sched).unwrap();

    assert!(sample.shutdown(&mut sched).is_clean());
    sim.drive_input("GPIO2_IO03", true);
    assert!(sink.events().is_empty());
    assert!(!sim.is_open("GPIO2_IO03"));
}

#[test]
fn button_open_failure_is_logged_not_fatal() {
    let sim = SimPeripherals::new();
    sim.inject_fault("GPIO6_IO14", SimOpKind::SetEdgeTrigger, IoError::Unsupported);
    let mut sched = Scheduler::new();
    let mut sample = ButtonSample::new(Board::Imx7dPico, sim.clone(), RecordingKeySink::new());

    assert_eq!(sample.initialize(&mut sched), Ok(()));
    assert!(!sample.is_registered());
    assert!(!sim.is_open("GPIO6_IO14"));
}

#[test]
fn driver_samples_reject_unknown_boards() {
    let sim = SimPeripherals::new();
    let config = SampleConfig::default();
    assert!(matches!(
        TemperatureSample::for_device("nope", sim.clone(), &config),
        Err(ConfigError::UnknownBoard)
    ));
    assert!(matches!(
        SegmentDisplaySample::for_device("nope", sim.clone(), &config),
        Err(ConfigError::UnknownBoard)
    ));
    assert!(matches!(
        ButtonSample::for_device("nope", sim.clone(), RecordingKeySink::new()),
        Err(ConfigError::UnknownBoard)
    ));
    assert!(sim.ops().is_empty());
}

// ── Temperature ───────────────────────────────────────────────

#[test]
fn temperature_reports_changes_until_shutdown() {
    let sim = SimPeripherals::new();
    let mut sched = Scheduler::new();
    let mut sample = TemperatureSample::for_device("rpi3", sim.clone(), &SampleConfig::default())
        .unwrap();
    sample.initialize(&mut sched).unwrap();

    sched.run_due(0);
    sim.set_temperature(24.0);
    sched.run_due(200);

    let report = sample.shutdown(&mut sched);
    assert!(report.is_clean());
    let bus_ops = sim.ops_for("I2C1");
    assert_eq!(bus_ops.first(), Some(&SimOp::OpenSensor("I2C1".into())));
    assert_eq!(
        &bus_ops[bus_ops.len() - 2..],
        &[
            SimOp::UnregisterSensor("I2C1".into()),
            SimOp::CloseSensor("I2C1".into()),
        ]
    );

    sim.clear_ops();
    sched.advance(1000);
    assert!(sim.ops().is_empty());
}

#[test]
fn temperature_and_display_share_the_bus() {
    let sim = SimPeripherals::new();
    let config = SampleConfig::default();
    let mut sched = Scheduler::new();
    let mut temperature = TemperatureSample::new(Board::Rpi3, sim.clone(), &config);
    let mut display = SegmentDisplaySample::new(Board::Rpi3, sim.clone(), &config);
    temperature.initialize(&mut sched).unwrap();
    display.initialize(&mut sched).unwrap();

    assert!(sim.is_open("I2C1"));
    assert!(sim.is_open("I2C1/ht16k33"));
    assert!(display.is_showing());

    let mut report = temperature.shutdown(&mut sched);
    report.merge(display.shutdown(&mut sched));
    assert_eq!(report.closed, 2);
}

// ── Segment display ───────────────────────────────────────────

#[test]
fn display_configures_before_writing_text() {
    let sim = SimPeripherals::new();
    let mut text = heapless::String::new();
    text.push_str("RUST").unwrap();
    let config = SampleConfig {
        display_text: text,
        display_brightness: 0.5,
        ..SampleConfig::default()
    };
    let mut sched = Scheduler::new();
    let mut sample = SegmentDisplaySample::new(Board::Imx6ulPico, sim.clone(), &config);
    sample.initialize(&mut sched).unwrap();

    let dev = "I2C2/ht16k33".to_owned();
    assert_eq!(
        sim.ops(),
        vec![
            SimOp::OpenDisplay(dev.clone()),
            SimOp::SetBrightness(dev.clone(), 0.5),
            SimOp::SetDisplayEnabled(dev.clone(), true),
            SimOp::ClearDisplay(dev.clone()),
            SimOp::Display(dev, "RUST".into()),
        ]
    );
}

#[test]
fn display_brightness_out_of_range_is_fatal() {
    let sim = SimPeripherals::new();
    let config = SampleConfig {
        display_brightness: 1.5,
        ..SampleConfig::default()
    };
    let mut sched = Scheduler::new();
    let mut sample = SegmentDisplaySample::new(Board::Rpi3, sim.clone(), &config);
    let err = sample.initialize(&mut sched).unwrap_err();
    assert!(err.is_fatal());
    assert!(sim.ops().is_empty());
}
