//! LED blink task.
//!
//! Two-state machine {LOW, HIGH}: every tick flips the level and writes
//! it to the LED's GPIO.  The task owns the pin; once the pin is closed
//! the next tick finds no handle and stops without rescheduling.

use log::{debug, warn};

use crate::app::ports::{DigitalIo, Direction, PeriodicTask, PeripheralManager, TickOutcome};
use crate::error::IoError;

pub struct LedBlinker<G: DigitalIo> {
    gpio: Option<G>,
    /// `true` = HIGH (LED on).
    state: bool,
}

impl<G: DigitalIo> LedBlinker<G> {
    /// Open `pin` as an output, driven LOW at first.
    pub fn open<M>(manager: &mut M, pin: &str) -> Result<Self, IoError>
    where
        M: PeripheralManager<Gpio = G>,
    {
        let mut gpio = manager.open_gpio(pin)?;
        if let Err(e) = gpio.set_direction(Direction::OutInitiallyLow) {
            // Release the half-configured pin; the configure error wins.
            let _ = gpio.close();
            return Err(e);
        }
        Ok(Self::from_gpio(gpio))
    }

    /// Wrap a pin that is already configured as an output.
    pub fn from_gpio(gpio: G) -> Self {
        Self {
            gpio: Some(gpio),
            state: false,
        }
    }

    /// Last level written (or LOW before the first tick).
    pub fn state(&self) -> bool {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.gpio.is_some()
    }
}

impl<G: DigitalIo> PeriodicTask for LedBlinker<G> {
    fn label(&self) -> &'static str {
        "blink"
    }

    fn tick(&mut self) -> Result<TickOutcome, IoError> {
        let Some(gpio) = self.gpio.as_mut() else {
            warn!("blink: GPIO already closed, stopping");
            return Ok(TickOutcome::Stop);
        };

        self.state = !self.state;
        gpio.set_value(self.state)?;
        debug!("blink: {} set to {}", gpio.name(), self.state);
        Ok(TickOutcome::Continue)
    }

    fn close(&mut self) -> Result<(), IoError> {
        match self.gpio.take() {
            Some(gpio) => gpio.close(),
            None => Ok(()),
        }
    }
}
