//! PIO sample lifecycle against the simulator: startup, scheduled
//! ticks, partial failures and shutdown.

use crate::mock_hw::{duty_cycles, writes_to};

use pio_samples::adapters::sim::{SimOp, SimOpKind, SimPeripherals};
use pio_samples::app::pio::{PioSample, PioStatus};
use pio_samples::scheduler::{StopReason, TaskStatus};
use pio_samples::{Board, ConfigError, IoError, Sample, SampleConfig, Scheduler};

fn started(board: Board, sim: &SimPeripherals) -> (PioSample<SimPeripherals>, Scheduler) {
    let mut sched = Scheduler::new();
    let mut pio = PioSample::new(board, sim.clone(), SampleConfig::default());
    pio.initialize(&mut sched).unwrap();
    (pio, sched)
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn unknown_board_fails_before_any_hardware_is_opened() {
    let sim = SimPeripherals::new();
    let result = PioSample::for_device("beaglebone", sim.clone(), SampleConfig::default());
    assert!(matches!(result, Err(ConfigError::UnknownBoard)));
    assert!(sim.ops().is_empty(), "no handle may be opened");
}

#[test]
fn servo_initialises_frequency_then_duty_then_enable() {
    let sim = SimPeripherals::new();
    let (_pio, _sched) = started(Board::Imx6ulPico, &sim);

    assert_eq!(
        sim.ops_for("PWM7"),
        vec![
            SimOp::OpenPwm("PWM7".into()),
            SimOp::SetFrequency("PWM7".into(), 50.0),
            SimOp::SetDutyCycle("PWM7".into(), 5.0),
            SimOp::SetEnabled("PWM7".into(), true),
        ]
    );
}

#[test]
fn failing_subsystem_leaves_the_others_running() {
    let sim = SimPeripherals::new();
    sim.inject_fault("PWM0", SimOpKind::Open, IoError::NoDevice);
    let (pio, mut sched) = started(Board::Rpi3, &sim);

    assert_eq!(
        pio.status(&sched),
        PioStatus {
            led_running: true,
            button_listening: true,
            servo_running: false,
        }
    );

    sched.run_due(0);
    sched.run_due(1000);
    sched.run_due(2000);
    assert_eq!(writes_to(&sim, "BCM6"), vec![true, false, true]);

    sim.drive_input("BCM21", false);
    assert_eq!(pio.button_presses(), 1);
}

#[test]
fn servo_configure_failure_releases_the_pwm() {
    let sim = SimPeripherals::new();
    sim.inject_fault("PWM0", SimOpKind::SetEnabled, IoError::Bus);
    let (pio, sched) = started(Board::Rpi3, &sim);

    assert!(!pio.status(&sched).servo_running);
    assert!(!sim.is_open("PWM0"));
    assert!(pio.status(&sched).led_running);
}

// ── Scheduled ticks ───────────────────────────────────────────

#[test]
fn led_and_servo_tick_on_their_own_intervals() {
    let sim = SimPeripherals::new();
    let config = SampleConfig {
        blink_interval_ms: 500,
        ..SampleConfig::default()
    };
    let mut sched = Scheduler::new();
    let mut pio = PioSample::new(Board::Rpi3, sim.clone(), config);
    pio.initialize(&mut sched).unwrap();

    for t in (0..=3000).step_by(100) {
        sched.run_due(t);
    }

    assert_eq!(writes_to(&sim, "BCM6").len(), 7);
    let duties = duty_cycles(&sim, "PWM0");
    // Initial duty plus one per second.
    assert_eq!(duties.len(), 5);
    let expected = [5.0, 6.0, 7.0, 8.0, 9.0];
    for (got, want) in duties.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "{got} != {want}");
    }
}

#[test]
fn closing_led_before_its_pending_tick_stops_all_writes() {
    let sim = SimPeripherals::new();
    let (mut pio, mut sched) = started(Board::Rpi3, &sim);
    sched.run_due(0);
    assert_eq!(writes_to(&sim, "BCM6"), vec![true]);

    let led = pio.led_handle().unwrap().clone();
    sched.close_channel(&led).unwrap();
    sim.clear_ops();

    sched.run_due(1000);
    sched.run_due(5000);
    assert!(writes_to(&sim, "BCM6").is_empty());
    assert_eq!(
        sched.status(&led),
        Some(TaskStatus::Stopped(StopReason::ChannelClosed))
    );

    // The servo is unaffected, and shutdown still succeeds.
    assert!(pio.status(&sched).servo_running);
    assert!(pio.shutdown(&mut sched).is_clean());
}

#[test]
fn led_write_failure_stops_only_the_led() {
    let sim = SimPeripherals::new();
    sim.inject_fault("BCM6", SimOpKind::SetValue, IoError::Bus);
    let (pio, mut sched) = started(Board::Rpi3, &sim);

    sched.run_due(0);
    sched.run_due(1000);
    let status = pio.status(&sched);
    assert!(!status.led_running);
    assert!(status.servo_running);
    assert_eq!(writes_to(&sim, "BCM6").len(), 1, "failed tick is not retried");
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_prevents_further_ticks() {
    let sim = SimPeripherals::new();
    let (mut pio, mut sched) = started(Board::Imx7dPico, &sim);
    sched.run_due(0);
    pio.shutdown(&mut sched);
    sim.clear_ops();

    assert_eq!(sched.advance(10_000), 0);
    assert!(sim.ops().is_empty());
    assert_eq!(pio.status(&sched), PioStatus::default());
}

#[test]
fn shutdown_closes_everything_even_when_one_close_fails() {
    let sim = SimPeripherals::new();
    sim.inject_fault("BCM6", SimOpKind::Close, IoError::Bus);
    let (mut pio, mut sched) = started(Board::Rpi3, &sim);

    let report = pio.shutdown(&mut sched);
    assert_eq!(report.closed, 2);
    assert_eq!(report.failures.as_slice(), &[("blink", IoError::Bus)]);
    assert!(sim.ops().contains(&SimOp::CloseGpio("BCM21".into())));
    assert!(sim.ops().contains(&SimOp::ClosePwm("PWM0".into())));
    assert!(!sim.is_open("BCM21"));
    assert!(!sim.is_open("PWM0"));
}

#[test]
fn shutdown_is_idempotent() {
    let sim = SimPeripherals::new();
    let (mut pio, mut sched) = started(Board::Rpi3, &sim);
    assert_eq!(pio.shutdown(&mut sched).closed, 3);

    let again = pio.shutdown(&mut sched);
    assert_eq!(again.closed, 0);
    assert!(again.is_clean());
}
