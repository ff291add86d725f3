//! Servo sweep over a PWM output.
//!
//! The active pulse duration oscillates between a minimum and maximum by
//! a fixed step per tick.  Reaching (or passing) a bound clamps the
//! duration to it and reverses direction:
//!
//! ```text
//!   1.0 → 1.2 → 1.4 → 1.6 → 1.8 → 2.0 (clamp, flip) → 1.8 → … → 1.0 (clamp, flip) → 1.2
//! ```
//!
//! The duty cycle written to hardware is always
//! `100 * active_duration / period`.
//!
//! ## Initialisation order
//!
//! Frequency, then initial duty cycle, then enable.  Enabling first would
//! emit pulses of whatever width the peripheral held before, which can
//! drive a servo past its mechanical limits.

use log::{debug, info, warn};

use crate::app::ports::{PeriodicTask, PeripheralManager, PwmOutput, TickOutcome};
use crate::config::SampleConfig;
use crate::error::{ConfigError, IoError};

/// Floating-point slack when comparing against a bound, so that
/// accumulated steps (1.0 + 5 × 0.2 = 1.9999999999999998) count as
/// reaching it.
const BOUND_EPSILON_MS: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Oscillator state machine
// ---------------------------------------------------------------------------

/// Pulse-width oscillation state.  Pure; no hardware.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseOscillator {
    active_ms: f64,
    increasing: bool,
    min_ms: f64,
    max_ms: f64,
    step_ms: f64,
    period_ms: f64,
}

impl PulseOscillator {
    /// Starts at `min_ms`, moving up.
    pub fn new(min_ms: f64, max_ms: f64, step_ms: f64, period_ms: f64) -> Result<Self, ConfigError> {
        if !(period_ms.is_finite() && period_ms > 0.0) {
            return Err(ConfigError::Invalid("pulse period must be positive"));
        }
        if !(min_ms.is_finite() && min_ms >= 0.0 && max_ms.is_finite() && min_ms <= max_ms) {
            return Err(ConfigError::Invalid("pulse bounds must satisfy 0 <= min <= max"));
        }
        if max_ms > period_ms {
            return Err(ConfigError::Invalid("max pulse exceeds period"));
        }
        if !(step_ms.is_finite() && step_ms > 0.0) {
            return Err(ConfigError::Invalid("pulse step must be positive"));
        }
        Ok(Self {
            active_ms: min_ms,
            increasing: true,
            min_ms,
            max_ms,
            step_ms,
            period_ms,
        })
    }

    pub fn from_config(config: &SampleConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.min_active_pulse_ms,
            config.max_active_pulse_ms,
            config.pulse_step_ms,
            config.pulse_period_ms,
        )
    }

    /// Start from an arbitrary point inside the bounds.  A non-finite
    /// `active_ms` starts at the lower bound.
    pub fn with_state(mut self, active_ms: f64, increasing: bool) -> Self {
        let active_ms = if active_ms.is_finite() { active_ms } else { self.min_ms };
        self.active_ms = active_ms.clamp(self.min_ms, self.max_ms);
        self.increasing = increasing;
        self
    }

    /// Move one step, bouncing off the bounds.  Returns the new duration.
    pub fn step(&mut self) -> f64 {
        if self.increasing {
            let next = self.active_ms + self.step_ms;
            if next >= self.max_ms - BOUND_EPSILON_MS {
                self.active_ms = self.max_ms;
                self.increasing = false;
            } else {
                self.active_ms = next;
            }
        } else {
            let next = self.active_ms - self.step_ms;
            if next <= self.min_ms + BOUND_EPSILON_MS {
                self.active_ms = self.min_ms;
                self.increasing = true;
            } else {
                self.active_ms = next;
            }
        }
        self.active_ms
    }

    pub fn active_ms(&self) -> f64 {
        self.active_ms
    }

    pub fn is_increasing(&self) -> bool {
        self.increasing
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min_ms, self.max_ms)
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    pub fn frequency_hz(&self) -> f64 {
        1000.0 / self.period_ms
    }

    /// Percentage of the period the pulse is active.
    pub fn duty_cycle_percent(&self) -> f64 {
        100.0 * self.active_ms / self.period_ms
    }
}

// ---------------------------------------------------------------------------
// PWM task
// ---------------------------------------------------------------------------

pub struct ServoSweep<P: PwmOutput> {
    pwm: Option<P>,
    oscillator: PulseOscillator,
}

impl<P: PwmOutput> ServoSweep<P> {
    /// Open `pin`, program frequency and initial duty cycle, then enable.
    pub fn open<M>(manager: &mut M, pin: &str, oscillator: PulseOscillator) -> Result<Self, IoError>
    where
        M: PeripheralManager<Pwm = P>,
    {
        let mut pwm = manager.open_pwm(pin)?;
        if let Err(e) = Self::configure(&mut pwm, &oscillator) {
            let _ = pwm.close();
            return Err(e);
        }
        info!(
            "servo: {} enabled at {:.1} Hz, pulse {:.2} ms",
            pwm.name(),
            oscillator.frequency_hz(),
            oscillator.active_ms()
        );
        Ok(Self {
            pwm: Some(pwm),
            oscillator,
        })
    }

    fn configure(pwm: &mut P, oscillator: &PulseOscillator) -> Result<(), IoError> {
        pwm.set_frequency_hz(oscillator.frequency_hz())?;
        pwm.set_duty_cycle_percent(oscillator.duty_cycle_percent())?;
        pwm.set_enabled(true)
    }

    pub fn oscillator(&self) -> &PulseOscillator {
        &self.oscillator
    }

    pub fn is_open(&self) -> bool {
        self.pwm.is_some()
    }
}

impl<P: PwmOutput> PeriodicTask for ServoSweep<P> {
    fn label(&self) -> &'static str {
        "servo"
    }

    fn tick(&mut self) -> Result<TickOutcome, IoError> {
        let Some(pwm) = self.pwm.as_mut() else {
            warn!("servo: PWM already closed, stopping");
            return Ok(TickOutcome::Stop);
        };

        let active = self.oscillator.step();
        debug!("servo: changing active pulse duration to {:.2} ms", active);
        pwm.set_duty_cycle_percent(self.oscillator.duty_cycle_percent())?;
        Ok(TickOutcome::Continue)
    }

    fn close(&mut self) -> Result<(), IoError> {
        match self.pwm.take() {
            Some(pwm) => pwm.close(),
            None => Ok(()),
        }
    }
}
