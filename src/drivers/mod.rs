//! Peripheral drivers: actuator tasks, button inputs, I2C one-shots.

pub mod button;
pub mod led_blink;
pub mod segment_display;
pub mod servo;
pub mod temperature;
