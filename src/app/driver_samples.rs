//! User-space driver samples: a temperature sensor polled on the
//! scheduler, a segment display written once, and a button exposed as a
//! key-event source.

use log::{error, info, warn};

use crate::board::Board;
use crate::config::SampleConfig;
use crate::drivers::button::{ButtonInputDriver, LogicState};
use crate::drivers::segment_display::SegmentDisplay;
use crate::drivers::temperature::TemperatureMonitor;
use crate::error::{ConfigError, Error};
use crate::scheduler::{Scheduler, ShutdownReport, TaskHandle};

use super::lifecycle::{Sample, start_or_close, stop_task};
use super::ports::{I2cPeripherals, KeyEventSink, PeripheralManager};

/// Key code emitted by the button sample (`KEYCODE_A`).
pub const KEYCODE_A: u16 = 29;

// ═══════════════════════════════════════════════════════════════
//  Temperature
// ═══════════════════════════════════════════════════════════════

pub struct TemperatureSample<M: I2cPeripherals> {
    manager: M,
    bus: &'static str,
    interval_ms: u32,
    task: Option<TaskHandle>,
}

impl<M> TemperatureSample<M>
where
    M: I2cPeripherals,
    M::Sensor: 'static,
{
    pub fn new(board: Board, manager: M, config: &SampleConfig) -> Self {
        Self {
            manager,
            bus: board.i2c_bus(),
            interval_ms: config.sensor_poll_interval_ms,
            task: None,
        }
    }

    pub fn for_device(device: &str, manager: M, config: &SampleConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Board::from_device(device)?, manager, config))
    }

    pub fn task(&self) -> Option<&TaskHandle> {
        self.task.as_ref()
    }
}

impl<M> Sample for TemperatureSample<M>
where
    M: I2cPeripherals,
    M::Sensor: 'static,
{
    fn name(&self) -> &'static str {
        "temperature"
    }

    fn initialize(&mut self, scheduler: &mut Scheduler) -> Result<(), Error> {
        if self.interval_ms == 0 {
            return Err(ConfigError::Invalid("sensor_poll_interval_ms must be non-zero").into());
        }
        if self.task.is_some() {
            warn!("temperature: already initialized");
            return Ok(());
        }
        if scheduler.free_slots() == 0 {
            error!("temperature: no scheduler slot, sensor left closed");
            return Ok(());
        }
        let monitor = match TemperatureMonitor::open(&mut self.manager, self.bus) {
            Ok(m) => m,
            Err(e) => {
                error!("temperature: sensor on {} init failed: {}", self.bus, e);
                return Ok(());
            }
        };
        self.task = start_or_close(scheduler, monitor, self.interval_ms);
        Ok(())
    }

    fn shutdown(&mut self, scheduler: &mut Scheduler) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        stop_task(scheduler, self.task.take(), "temperature", &mut report);
        report
    }
}

// ═══════════════════════════════════════════════════════════════
//  Segment display
// ═══════════════════════════════════════════════════════════════

pub struct SegmentDisplaySample<M: I2cPeripherals> {
    manager: M,
    bus: &'static str,
    text: heapless::String<8>,
    brightness: f32,
    display: Option<SegmentDisplay<M::Display>>,
}

impl<M: I2cPeripherals> SegmentDisplaySample<M> {
    pub fn new(board: Board, manager: M, config: &SampleConfig) -> Self {
        Self {
            manager,
            bus: board.i2c_bus(),
            text: config.display_text.clone(),
            brightness: config.display_brightness,
            display: None,
        }
    }

    pub fn for_device(device: &str, manager: M, config: &SampleConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Board::from_device(device)?, manager, config))
    }

    pub fn is_showing(&self) -> bool {
        self.display.as_ref().is_some_and(|d| d.is_open())
    }
}

impl<M: I2cPeripherals> Sample for SegmentDisplaySample<M> {
    fn name(&self) -> &'static str {
        "segment_display"
    }

    fn initialize(&mut self, _scheduler: &mut Scheduler) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.brightness) {
            return Err(ConfigError::Invalid("display_brightness outside 0.0..=1.0").into());
        }
        if self.display.is_some() {
            warn!("display: already initialized");
            return Ok(());
        }
        let mut display = match SegmentDisplay::open(&mut self.manager, self.bus, self.brightness) {
            Ok(d) => d,
            Err(e) => {
                error!("display: init on {} failed: {}", self.bus, e);
                return Ok(());
            }
        };
        if let Err(e) = display.show(&self.text) {
            error!("display: write failed: {}; closing", e);
            if let Err(e) = display.close() {
                error!("display: close failed: {}", e);
            }
            return Ok(());
        }
        self.display = Some(display);
        Ok(())
    }

    fn shutdown(&mut self, _scheduler: &mut Scheduler) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        if let Some(mut display) = self.display.take() {
            report.record("display", display.close());
        }
        report
    }
}

// ═══════════════════════════════════════════════════════════════
//  Button input driver
// ═══════════════════════════════════════════════════════════════

/// Button wired with a pull-down, reported as `KEYCODE_A` to `sink`.
pub struct ButtonSample<M: PeripheralManager, S> {
    manager: M,
    pin: &'static str,
    sink: Option<S>,
    driver: Option<ButtonInputDriver<M::Gpio>>,
}

impl<M, S> ButtonSample<M, S>
where
    M: PeripheralManager,
    S: KeyEventSink + 'static,
{
    pub fn new(board: Board, manager: M, sink: S) -> Self {
        Self {
            manager,
            pin: board.button_gpio(),
            sink: Some(sink),
            driver: None,
        }
    }

    pub fn for_device(device: &str, manager: M, sink: S) -> Result<Self, ConfigError> {
        Ok(Self::new(Board::from_device(device)?, manager, sink))
    }

    pub fn is_registered(&self) -> bool {
        self.driver.is_some()
    }

    pub fn is_pressed(&self) -> bool {
        self.driver.as_ref().is_some_and(|d| d.is_pressed())
    }
}

impl<M, S> Sample for ButtonSample<M, S>
where
    M: PeripheralManager,
    S: KeyEventSink + 'static,
{
    fn name(&self) -> &'static str {
        "button"
    }

    fn initialize(&mut self, _scheduler: &mut Scheduler) -> Result<(), Error> {
        let Some(sink) = self.sink.take() else {
            // Already initialized once; the sink moved into the driver.
            return Ok(());
        };
        let mut driver = match ButtonInputDriver::open(
            &mut self.manager,
            self.pin,
            LogicState::PressedWhenHigh,
            KEYCODE_A,
        ) {
            Ok(d) => d,
            Err(e) => {
                error!("button: {} init failed: {}", self.pin, e);
                return Ok(());
            }
        };
        if let Err(e) = driver.register(sink) {
            error!("button: register failed: {}", e);
            if let Err(e) = driver.close() {
                error!("button: close failed: {}", e);
            }
            return Ok(());
        }
        info!("button: {} reporting key code {}", self.pin, KEYCODE_A);
        self.driver = Some(driver);
        Ok(())
    }

    fn poll_inputs(&mut self) {
        let Some(driver) = self.driver.as_mut() else {
            return;
        };
        if let Err(e) = driver.poll() {
            error!("button: poll failed: {}; closing", e);
            if let Err(e) = driver.close() {
                error!("button: close failed: {}", e);
            }
            self.driver = None;
        }
    }

    fn shutdown(&mut self, _scheduler: &mut Scheduler) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        if let Some(mut driver) = self.driver.take() {
            report.record("button", driver.close());
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sim::{SimOp, SimOpKind, SimPeripherals};
    use crate::app::ports::{KeyEvent, PeriodicTask, TickOutcome};
    use crate::error::IoError;
    use crate::scheduler::{MAX_TASKS, TaskStatus};

    struct Idle;

    impl PeriodicTask for Idle {
        fn label(&self) -> &'static str {
            "idle"
        }

        fn tick(&mut self) -> Result<TickOutcome, IoError> {
            Ok(TickOutcome::Continue)
        }

        fn close(&mut self) -> Result<(), IoError> {
            Ok(())
        }
    }

    struct Discard;

    impl KeyEventSink for Discard {
        fn on_key_event(&mut self, _event: KeyEvent) {}
    }

    #[test]
    fn temperature_polls_on_interval() {
        let sim = SimPeripherals::new();
        let mut sched = Scheduler::new();
        let mut sample = TemperatureSample::new(Board::Rpi3, sim.clone(), &SampleConfig::default());
        sample.initialize(&mut sched).unwrap();

        sched.run_due(0);
        sched.run_due(200);
        sched.run_due(399);
        assert_eq!(sim.count(|op| matches!(op, SimOp::ReadSensor(_))), 2);

        let report = sample.shutdown(&mut sched);
        assert!(report.is_clean());
        assert!(!sim.is_open("I2C1"));
    }

    #[test]
    fn temperature_bus_failure_is_not_fatal() {
        let sim = SimPeripherals::new();
        sim.inject_fault("I2C2", SimOpKind::Open, IoError::NoDevice);
        let mut sched = Scheduler::new();
        let mut sample =
            TemperatureSample::new(Board::Imx6ulPico, sim.clone(), &SampleConfig::default());
        assert_eq!(sample.initialize(&mut sched), Ok(()));
        assert!(sample.task().is_none());
    }

    #[test]
    fn temperature_leaves_sensor_closed_when_scheduler_is_full() {
        let sim = SimPeripherals::new();
        let mut sched = Scheduler::new();
        for _ in 0..MAX_TASKS {
            sched.start(Idle, 100).unwrap();
        }
        let mut sample = TemperatureSample::new(Board::Rpi3, sim.clone(), &SampleConfig::default());
        assert_eq!(sample.initialize(&mut sched), Ok(()));

        assert!(sample.task().is_none());
        assert!(!sim.is_open("I2C1"));
        assert_eq!(sim.count(|op| matches!(op, SimOp::OpenSensor(_))), 0);
        assert_eq!(sample.shutdown(&mut sched).closed, 0);
    }

    #[test]
    fn refused_task_is_closed_by_start_or_close() {
        let mut sim = SimPeripherals::new();
        let mut sched = Scheduler::new();
        for _ in 0..MAX_TASKS {
            sched.start(Idle, 100).unwrap();
        }
        let monitor = TemperatureMonitor::open(&mut sim, "I2C1").unwrap();
        assert!(start_or_close(&mut sched, monitor, 200).is_none());
        assert!(!sim.is_open("I2C1"));
        assert_eq!(sim.count(|op| matches!(op, SimOp::UnregisterSensor(_))), 1);
    }

    #[test]
    fn temperature_second_initialize_is_a_no_op() {
        let sim = SimPeripherals::new();
        let mut sched = Scheduler::new();
        let mut sample = TemperatureSample::new(Board::Rpi3, sim.clone(), &SampleConfig::default());
        sample.initialize(&mut sched).unwrap();
        sample.initialize(&mut sched).unwrap();

        assert_eq!(sim.count(|op| matches!(op, SimOp::OpenSensor(_))), 1);
        assert_eq!(sched.free_slots(), MAX_TASKS - 1);
        assert_eq!(sample.shutdown(&mut sched).closed, 1);
        assert!(!sim.is_open("I2C1"));
    }

    #[test]
    fn temperature_read_failure_parks_task() {
        let sim = SimPeripherals::new();
        sim.inject_fault("I2C1", SimOpKind::Read, IoError::Bus);
        let mut sched = Scheduler::new();
        let mut sample = TemperatureSample::new(Board::Rpi3, sim.clone(), &SampleConfig::default());
        sample.initialize(&mut sched).unwrap();
        sched.run_due(0);

        let handle = sample.task().unwrap().clone();
        assert_eq!(
            sched.status(&handle),
            Some(TaskStatus::Stopped(crate::scheduler::StopReason::Failed(IoError::Bus)))
        );
        assert!(sample.shutdown(&mut sched).is_clean());
    }

    #[test]
    fn display_shows_configured_text() {
        let sim = SimPeripherals::new();
        let mut sched = Scheduler::new();
        let mut sample =
            SegmentDisplaySample::new(Board::Imx7dPico, sim.clone(), &SampleConfig::default());
        sample.initialize(&mut sched).unwrap();
        assert!(sample.is_showing());
        assert!(sim.ops().contains(&SimOp::Display("I2C1/ht16k33".into(), "ABCD".into())));

        assert_eq!(sample.shutdown(&mut sched).closed, 1);
        assert!(!sim.is_open("I2C1/ht16k33"));
    }

    #[test]
    fn display_write_failure_closes_display() {
        let sim = SimPeripherals::new();
        sim.inject_fault("I2C1/ht16k33", SimOpKind::Display, IoError::Bus);
        let mut sched = Scheduler::new();
        let mut sample = SegmentDisplaySample::new(Board::Rpi3, sim.clone(), &SampleConfig::default());
        sample.initialize(&mut sched).unwrap();
        assert!(!sample.is_showing());
        assert!(!sim.is_open("I2C1/ht16k33"));
    }

    #[test]
    fn display_second_initialize_writes_once() {
        let sim = SimPeripherals::new();
        let mut sched = Scheduler::new();
        let mut sample = SegmentDisplaySample::new(Board::Rpi3, sim.clone(), &SampleConfig::default());
        sample.initialize(&mut sched).unwrap();
        sample.initialize(&mut sched).unwrap();

        assert_eq!(sim.count(|op| matches!(op, SimOp::Display(..))), 1);
        assert_eq!(sample.shutdown(&mut sched).closed, 1);
    }

    #[test]
    fn button_poll_failure_unregisters_driver() {
        let sim = SimPeripherals::new();
        let mut sched = Scheduler::new();
        let mut sample = ButtonSample::new(Board::Rpi3, sim.clone(), Discard);
        sample.initialize(&mut sched).unwrap();
        assert!(sample.is_registered());

        sim.inject_fault("BCM21", SimOpKind::Poll, IoError::Bus);
        sample.poll_inputs();
        assert!(!sample.is_registered());
        assert!(!sim.is_open("BCM21"));
        assert!(sample.shutdown(&mut sched).is_clean());
    }
}
