//! Sample configuration parameters
//!
//! All tunable parameters for the peripheral samples.  Defaults drive a
//! standard hobby servo (50 Hz, 1–2 ms pulse) and a 1 Hz LED blink.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core sample configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    // --- LED ---
    /// Delay between LED toggles (milliseconds)
    pub blink_interval_ms: u32,

    // --- Servo PWM ---
    /// Full PWM period (milliseconds); 20 ms = 50 Hz
    pub pulse_period_ms: f64,
    /// Shortest active pulse (milliseconds)
    pub min_active_pulse_ms: f64,
    /// Longest active pulse (milliseconds)
    pub max_active_pulse_ms: f64,
    /// Change of the active pulse per step (milliseconds)
    pub pulse_step_ms: f64,
    /// Delay between pulse changes (milliseconds)
    pub pulse_change_delay_ms: u32,

    // --- Temperature sensor ---
    /// Delay between sensor reads (milliseconds)
    pub sensor_poll_interval_ms: u32,

    // --- Segment display ---
    /// Text shown by the segment display sample
    pub display_text: heapless::String<8>,
    /// Display brightness (0.0–1.0)
    pub display_brightness: f32,
}

impl Default for SampleConfig {
    fn default() -> Self {
        let mut display_text = heapless::String::new();
        // Four characters always fit in eight.
        let _ = display_text.push_str("ABCD");

        Self {
            // LED
            blink_interval_ms: 1000,

            // Servo
            pulse_period_ms: 20.0,
            min_active_pulse_ms: 1.0,
            max_active_pulse_ms: 2.0,
            pulse_step_ms: 0.2,
            pulse_change_delay_ms: 1000,

            // Sensor
            sensor_poll_interval_ms: 200,

            // Display
            display_text,
            display_brightness: 1.0,
        }
    }
}

impl SampleConfig {
    /// PWM frequency implied by the pulse period.
    pub fn pwm_frequency_hz(&self) -> f64 {
        1000.0 / self.pulse_period_ms
    }

    /// Reject values that would break the oscillator or scheduler
    /// invariants.  Invalid ranges are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blink_interval_ms == 0 {
            return Err(ConfigError::Invalid("blink_interval_ms must be non-zero"));
        }
        if self.pulse_change_delay_ms == 0 {
            return Err(ConfigError::Invalid("pulse_change_delay_ms must be non-zero"));
        }
        if self.sensor_poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("sensor_poll_interval_ms must be non-zero"));
        }
        if !(self.pulse_period_ms.is_finite() && self.pulse_period_ms > 0.0) {
            return Err(ConfigError::Invalid("pulse_period_ms must be positive"));
        }
        if !(self.min_active_pulse_ms.is_finite() && self.min_active_pulse_ms >= 0.0) {
            return Err(ConfigError::Invalid("min_active_pulse_ms must be non-negative"));
        }
        if !(self.max_active_pulse_ms.is_finite()
            && self.max_active_pulse_ms >= self.min_active_pulse_ms)
        {
            return Err(ConfigError::Invalid("max_active_pulse_ms below minimum"));
        }
        if self.max_active_pulse_ms > self.pulse_period_ms {
            return Err(ConfigError::Invalid("max_active_pulse_ms exceeds period"));
        }
        if !(self.pulse_step_ms.is_finite() && self.pulse_step_ms > 0.0) {
            return Err(ConfigError::Invalid("pulse_step_ms must be positive"));
        }
        if !(0.0..=1.0).contains(&self.display_brightness) {
            return Err(ConfigError::Invalid("display_brightness outside 0.0..=1.0"));
        }
        Ok(())
    }
}
