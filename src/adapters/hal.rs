//! `embedded-hal` 1.0 adapter.
//!
//! Wraps any HAL pin or PWM channel so the drivers can run on a real
//! board.  Two limitations of the generic traits shape this adapter:
//!
//! - There is no interrupt API, so edges are detected in software by
//!   [`DigitalIo::poll_edges`], which the main loop calls between ticks.
//! - `SetDutyCycle` has no frequency control; the timer runs at the
//!   frequency fixed at construction and any other request is
//!   [`IoError::Unsupported`].

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;
use log::{debug, warn};

use crate::app::ports::{DigitalIo, Direction, Edge, EdgeCallback, PwmOutput};
use crate::error::IoError;

/// Largest frequency mismatch treated as "the same frequency".
const FREQUENCY_TOLERANCE_HZ: f64 = 1e-6;

// ═══════════════════════════════════════════════════════════════
//  GPIO
// ═══════════════════════════════════════════════════════════════

pub struct HalGpio<P> {
    name: String,
    pin: P,
    direction: Option<Direction>,
    edge: Edge,
    /// Level seen at the last poll; `None` until sampled.
    last_level: Option<bool>,
    callback: Option<EdgeCallback>,
}

impl<P: InputPin + OutputPin> HalGpio<P> {
    pub fn new(name: impl Into<String>, pin: P) -> Self {
        Self {
            name: name.into(),
            pin,
            direction: None,
            edge: Edge::None,
            last_level: None,
            callback: None,
        }
    }

    fn is_output(&self) -> bool {
        matches!(
            self.direction,
            Some(Direction::OutInitiallyLow | Direction::OutInitiallyHigh)
        )
    }

    fn write(&mut self, high: bool) -> Result<(), IoError> {
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| {
            warn!("hal: {} write failed", self.name);
            IoError::Bus
        })
    }

    fn read(&mut self) -> Result<bool, IoError> {
        self.pin.is_high().map_err(|_| {
            warn!("hal: {} read failed", self.name);
            IoError::Bus
        })
    }
}

impl<P: InputPin + OutputPin> DigitalIo for HalGpio<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), IoError> {
        match direction {
            Direction::In => {}
            Direction::OutInitiallyLow => self.write(false)?,
            Direction::OutInitiallyHigh => self.write(true)?,
        }
        self.direction = Some(direction);
        Ok(())
    }

    fn set_value(&mut self, high: bool) -> Result<(), IoError> {
        if !self.is_output() {
            return Err(IoError::Unsupported);
        }
        self.write(high)
    }

    fn value(&mut self) -> Result<bool, IoError> {
        self.read()
    }

    fn set_edge_trigger(&mut self, edge: Edge) -> Result<(), IoError> {
        self.edge = edge;
        // Edges are measured from the level at the time of arming.
        self.last_level = Some(self.read()?);
        Ok(())
    }

    fn register_edge_callback(&mut self, callback: EdgeCallback) -> Result<(), IoError> {
        if self.last_level.is_none() {
            self.last_level = Some(self.read()?);
        }
        self.callback = Some(callback);
        Ok(())
    }

    fn unregister_edge_callback(&mut self) {
        self.callback = None;
    }

    fn poll_edges(&mut self) -> Result<(), IoError> {
        if self.callback.is_none() {
            return Ok(());
        }
        let level = self.read()?;
        let previous = self.last_level.replace(level);
        if previous == Some(level) || !self.edge.matches(level) {
            return Ok(());
        }
        if let Some(callback) = self.callback.as_mut() {
            if !callback(level) {
                debug!("hal: {} callback finished", self.name);
                self.callback = None;
            }
        }
        Ok(())
    }

    fn close(self) -> Result<(), IoError> {
        debug!("hal: {} released", self.name);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  PWM
// ═══════════════════════════════════════════════════════════════

pub struct HalPwm<P> {
    name: String,
    channel: P,
    frequency_hz: f64,
    duty_percent: f64,
    enabled: bool,
}

impl<P: SetDutyCycle> HalPwm<P> {
    /// `frequency_hz` is the rate the channel's timer was configured with.
    pub fn new(name: impl Into<String>, channel: P, frequency_hz: f64) -> Self {
        Self {
            name: name.into(),
            channel,
            frequency_hz,
            duty_percent: 0.0,
            enabled: false,
        }
    }

    /// Raw duty value for `percent` of the channel's range.
    pub fn raw_duty(&self, percent: f64) -> u16 {
        let max = self.channel.max_duty_cycle();
        let raw = (f64::from(max) * percent / 100.0).round();
        // `percent` is validated to 0..=100, so this only trims rounding.
        (raw as u16).min(max)
    }

    fn apply(&mut self) -> Result<(), IoError> {
        let raw = if self.enabled {
            self.raw_duty(self.duty_percent)
        } else {
            0
        };
        self.channel.set_duty_cycle(raw).map_err(|_| {
            warn!("hal: {} duty write failed", self.name);
            IoError::Bus
        })
    }
}

impl<P: SetDutyCycle> PwmOutput for HalPwm<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_frequency_hz(&mut self, hz: f64) -> Result<(), IoError> {
        if !(hz.is_finite() && hz > 0.0) {
            return Err(IoError::InvalidArgument);
        }
        if (hz - self.frequency_hz).abs() > FREQUENCY_TOLERANCE_HZ {
            warn!(
                "hal: {} runs at {:.1} Hz, {:.1} Hz requested",
                self.name, self.frequency_hz, hz
            );
            return Err(IoError::Unsupported);
        }
        Ok(())
    }

    fn set_duty_cycle_percent(&mut self, percent: f64) -> Result<(), IoError> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(IoError::InvalidArgument);
        }
        self.duty_percent = percent;
        if self.enabled {
            self.apply()?;
        }
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), IoError> {
        self.enabled = enabled;
        self.apply()
    }

    fn close(mut self) -> Result<(), IoError> {
        self.channel.set_duty_cycle_fully_off().map_err(|_| IoError::Bus)?;
        debug!("hal: {} released", self.name);
        Ok(())
    }
}
