//! Port traits — the hexagonal boundary between sample logic and hardware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ drivers / samples (domain)
//! ```
//!
//! Peripheral adapters (embedded-hal pins, the in-memory simulator, a
//! vendor driver library) implement these traits.  The drivers consume
//! them via generics, so sample logic never touches registers directly.
//!
//! ## Handle contract
//!
//! - Every hardware call is synchronous and may fail with an [`IoError`].
//! - `close` consumes the handle, so a closed handle cannot be used again.
//! - Dropping an open handle releases it without reporting errors; call
//!   `close` when the failure matters.

use crate::error::IoError;

// ───────────────────────────────────────────────────────────────
// Digital I/O
// ───────────────────────────────────────────────────────────────

/// Pin direction and, for outputs, the level driven on configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    OutInitiallyLow,
    OutInitiallyHigh,
}

/// Signal transitions that fire the edge callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    None,
    Rising,
    Falling,
    Both,
}

impl Edge {
    /// Does a transition to `level` match this trigger?
    pub const fn matches(self, level: bool) -> bool {
        match self {
            Self::None => false,
            Self::Rising => level,
            Self::Falling => !level,
            Self::Both => true,
        }
    }
}

/// Edge callback.  Receives the new pin level; return `true` to keep
/// listening, `false` to unregister.
pub type EdgeCallback = Box<dyn FnMut(bool) -> bool + Send>;

/// One GPIO pin.
pub trait DigitalIo {
    /// Name the pin was opened under.
    fn name(&self) -> &str;

    fn set_direction(&mut self, direction: Direction) -> Result<(), IoError>;

    /// Drive an output pin (`true` = HIGH).
    fn set_value(&mut self, high: bool) -> Result<(), IoError>;

    /// Current pin level.
    fn value(&mut self) -> Result<bool, IoError>;

    fn set_edge_trigger(&mut self, edge: Edge) -> Result<(), IoError>;

    /// Install the edge callback, replacing any previous one.
    fn register_edge_callback(&mut self, callback: EdgeCallback) -> Result<(), IoError>;

    fn unregister_edge_callback(&mut self);

    /// Deliver pending edges.  Interrupt-driven adapters deliver on their
    /// own and keep this no-op; polled adapters sample the pin here.
    fn poll_edges(&mut self) -> Result<(), IoError> {
        Ok(())
    }

    /// Release the pin.  Unregisters any edge callback.
    fn close(self) -> Result<(), IoError>
    where
        Self: Sized;
}

// ───────────────────────────────────────────────────────────────
// Pulse-width output
// ───────────────────────────────────────────────────────────────

/// One PWM output.
///
/// Frequency must be set before the duty cycle, and the duty cycle
/// before the output is enabled.
pub trait PwmOutput {
    fn name(&self) -> &str;

    fn set_frequency_hz(&mut self, hz: f64) -> Result<(), IoError>;

    /// Percentage (0–100) of each period the pulse is active.
    fn set_duty_cycle_percent(&mut self, percent: f64) -> Result<(), IoError>;

    fn set_enabled(&mut self, enabled: bool) -> Result<(), IoError>;

    fn close(self) -> Result<(), IoError>
    where
        Self: Sized;
}

/// Opens GPIO and PWM handles by board pin name.
pub trait PeripheralManager {
    type Gpio: DigitalIo;
    type Pwm: PwmOutput;

    fn open_gpio(&mut self, name: &str) -> Result<Self::Gpio, IoError>;

    fn open_pwm(&mut self, name: &str) -> Result<Self::Pwm, IoError>;
}

// ───────────────────────────────────────────────────────────────
// I2C drivers (sensor, display)
// ───────────────────────────────────────────────────────────────

/// Ambient temperature sensor (e.g. BMP280 over I2C).
pub trait TemperatureSensor {
    /// Register the device with the host as a temperature sensor.
    fn register(&mut self) -> Result<(), IoError>;

    fn read_celsius(&mut self) -> Result<f32, IoError>;

    fn unregister(&mut self);

    fn close(self) -> Result<(), IoError>
    where
        Self: Sized;
}

/// Four-character alphanumeric segment display (e.g. HT16K33).
pub trait AlphanumericDisplay {
    /// Brightness in 0.0–1.0.
    fn set_brightness(&mut self, level: f32) -> Result<(), IoError>;

    fn set_enabled(&mut self, enabled: bool) -> Result<(), IoError>;

    fn clear(&mut self) -> Result<(), IoError>;

    fn display(&mut self, text: &str) -> Result<(), IoError>;

    fn close(self) -> Result<(), IoError>
    where
        Self: Sized;
}

/// Opens I2C-attached drivers by bus name.
pub trait I2cPeripherals {
    type Sensor: TemperatureSensor;
    type Display: AlphanumericDisplay;

    fn open_temperature_sensor(&mut self, bus: &str) -> Result<Self::Sensor, IoError>;

    fn open_segment_display(&mut self, bus: &str) -> Result<Self::Display, IoError>;
}

// ───────────────────────────────────────────────────────────────
// Key events (button input driver → host)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: u16,
    pub action: KeyAction,
}

/// Receives key events generated by a button driver.
pub trait KeyEventSink: Send {
    fn on_key_event(&mut self, event: KeyEvent);
}

// ───────────────────────────────────────────────────────────────
// Periodic task (scheduler ↔ actuator drivers)
// ───────────────────────────────────────────────────────────────

/// What a task wants after one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Re-arm after the task's interval.
    Continue,
    /// The channel is gone; never run again.
    Stop,
}

/// One repeating compute-then-apply update owned by the
/// [`Scheduler`](crate::scheduler::Scheduler).
///
/// The task exclusively owns its hardware handle.  `tick` must check the
/// handle is still open before touching hardware and return
/// [`TickOutcome::Stop`] if it is not.
pub trait PeriodicTask {
    /// Short label for logs (e.g. `"blink"`).
    fn label(&self) -> &'static str;

    fn tick(&mut self) -> Result<TickOutcome, IoError>;

    /// Close the owned handle.  Idempotent: closing an already-closed
    /// task succeeds.
    fn close(&mut self) -> Result<(), IoError>;
}
