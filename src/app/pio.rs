//! Peripheral I/O sample: a blinking LED, a button listener and a
//! sweeping servo sharing one scheduler.
//!
//! ```text
//!   board ──▶ pins ──▶ LedBlinker   ──▶ Scheduler (blink_interval_ms)
//!                  ├─▶ ButtonListener (falling edge, logs each press)
//!                  └─▶ ServoSweep   ──▶ Scheduler (pulse_change_delay_ms)
//! ```
//!
//! The three subsystems are independent: an I/O failure while bringing
//! one up is logged and only that one is abandoned.

use log::{error, info, warn};

use crate::board::{Board, BoardPins};
use crate::config::SampleConfig;
use crate::drivers::button::ButtonListener;
use crate::drivers::led_blink::LedBlinker;
use crate::drivers::servo::{PulseOscillator, ServoSweep};
use crate::error::{ConfigError, Error};
use crate::scheduler::{Scheduler, ShutdownReport, TaskHandle, TaskStatus};

use super::lifecycle::{Sample, start_or_close, stop_task};
use super::ports::PeripheralManager;

/// Which subsystems are live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PioStatus {
    pub led_running: bool,
    pub button_listening: bool,
    pub servo_running: bool,
}

pub struct PioSample<M: PeripheralManager> {
    manager: M,
    board: Board,
    pins: BoardPins,
    config: SampleConfig,
    led: Option<TaskHandle>,
    button: Option<ButtonListener<M::Gpio>>,
    servo: Option<TaskHandle>,
}

impl<M> PioSample<M>
where
    M: PeripheralManager,
    M::Gpio: 'static,
    M::Pwm: 'static,
{
    pub fn new(board: Board, manager: M, config: SampleConfig) -> Self {
        Self {
            manager,
            board,
            pins: board.pins(),
            config,
            led: None,
            button: None,
            servo: None,
        }
    }

    /// Resolve `device` first; an unknown board fails before the manager
    /// is ever asked for a handle.
    pub fn for_device(device: &str, manager: M, config: SampleConfig) -> Result<Self, ConfigError> {
        let board = Board::from_device(device)?;
        Ok(Self::new(board, manager, config))
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn status(&self, scheduler: &Scheduler) -> PioStatus {
        let armed = |handle: &Option<TaskHandle>| {
            handle
                .as_ref()
                .and_then(|h| scheduler.status(h))
                .is_some_and(|s| matches!(s, TaskStatus::Armed { .. }))
        };
        PioStatus {
            led_running: armed(&self.led),
            button_listening: self.button.as_ref().is_some_and(|b| b.is_open()),
            servo_running: armed(&self.servo),
        }
    }

    pub fn led_handle(&self) -> Option<&TaskHandle> {
        self.led.as_ref()
    }

    pub fn servo_handle(&self) -> Option<&TaskHandle> {
        self.servo.as_ref()
    }

    /// Presses seen by the button listener, zero if it is not running.
    pub fn button_presses(&self) -> u32 {
        self.button.as_ref().map_or(0, |b| b.presses())
    }

    // ── Subsystem bring-up ────────────────────────────────────

    fn start_led(&mut self, scheduler: &mut Scheduler) -> Option<TaskHandle> {
        if scheduler.free_slots() == 0 {
            error!("pio: no scheduler slot for the LED");
            return None;
        }
        let blinker = match LedBlinker::open(&mut self.manager, self.pins.led_gpio) {
            Ok(b) => b,
            Err(e) => {
                error!("pio: LED {} init failed: {}", self.pins.led_gpio, e);
                return None;
            }
        };
        start_or_close(scheduler, blinker, self.config.blink_interval_ms)
    }

    fn start_button(&mut self) -> Option<ButtonListener<M::Gpio>> {
        match ButtonListener::open(&mut self.manager, self.pins.button_gpio) {
            Ok(b) => Some(b),
            Err(e) => {
                error!("pio: button {} init failed: {}", self.pins.button_gpio, e);
                None
            }
        }
    }

    fn start_servo(
        &mut self,
        scheduler: &mut Scheduler,
        oscillator: PulseOscillator,
    ) -> Option<TaskHandle> {
        if scheduler.free_slots() == 0 {
            error!("pio: no scheduler slot for the servo");
            return None;
        }
        let sweep = match ServoSweep::open(&mut self.manager, self.pins.pwm, oscillator) {
            Ok(s) => s,
            Err(e) => {
                error!("pio: PWM {} init failed: {}", self.pins.pwm, e);
                return None;
            }
        };
        start_or_close(scheduler, sweep, self.config.pulse_change_delay_ms)
    }
}

impl<M> Sample for PioSample<M>
where
    M: PeripheralManager,
    M::Gpio: 'static,
    M::Pwm: 'static,
{
    fn name(&self) -> &'static str {
        "pio"
    }

    fn initialize(&mut self, scheduler: &mut Scheduler) -> Result<(), Error> {
        self.config.validate()?;
        let oscillator = PulseOscillator::from_config(&self.config)?;
        if self.led.is_some() || self.button.is_some() || self.servo.is_some() {
            warn!("{}: already initialized", self.name());
            return Ok(());
        }

        info!(
            "pio: starting on {} (LED {}, button {}, PWM {})",
            self.board, self.pins.led_gpio, self.pins.button_gpio, self.pins.pwm
        );
        self.led = self.start_led(scheduler);
        self.button = self.start_button();
        self.servo = self.start_servo(scheduler, oscillator);

        let status = self.status(scheduler);
        if status == PioStatus::default() {
            warn!("pio: no subsystem came up");
        }
        Ok(())
    }

    fn poll_inputs(&mut self) {
        let Some(button) = self.button.as_mut() else {
            return;
        };
        if let Err(e) = button.poll() {
            error!("pio: button poll failed: {}; closing", e);
            if let Err(e) = button.close() {
                error!("pio: button close failed: {}", e);
            }
            self.button = None;
        }
    }

    fn shutdown(&mut self, scheduler: &mut Scheduler) -> ShutdownReport {
        // No tick may run once closing starts.
        for handle in [&self.led, &self.servo].into_iter().flatten() {
            scheduler.cancel(handle);
        }

        let mut report = ShutdownReport::default();
        stop_task(scheduler, self.led.take(), "blink", &mut report);
        if let Some(mut button) = self.button.take() {
            report.record("button", button.close());
        }
        stop_task(scheduler, self.servo.take(), "servo", &mut report);

        info!(
            "pio: shut down ({} closed, {} failed)",
            report.closed,
            report.failures.len()
        );
        report
    }
}
