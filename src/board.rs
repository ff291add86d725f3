//! Board identifier → peripheral name lookup.
//!
//! Single source of truth for pin names: every sample resolves its
//! peripherals through this module rather than hard-coding them.  An
//! unrecognised board is a fatal [`ConfigError::UnknownBoard`], raised
//! before any handle is opened.

use core::fmt;
use core::str::FromStr;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Board identifiers
// ---------------------------------------------------------------------------

const DEVICE_RPI3: &str = "rpi3";
const DEVICE_IMX6UL_PICO: &str = "imx6ul_pico";
const DEVICE_IMX7D_PICO: &str = "imx7d_pico";
const DEVICE_ESP32S3_DEVKIT: &str = "esp32s3_devkit";

/// Supported single-board computers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Board {
    /// Raspberry Pi 3 (BCM pin numbering).
    Rpi3,
    /// NXP i.MX6UL Pico.
    Imx6ulPico,
    /// NXP i.MX7D Pico.
    Imx7dPico,
    /// ESP32-S3 DevKitC (the firmware binary's target).
    Esp32S3Devkit,
}

/// Every pin name one board exposes to the samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardPins {
    pub led_gpio: &'static str,
    pub button_gpio: &'static str,
    pub pwm: &'static str,
    pub i2c_bus: &'static str,
}

impl Board {
    pub const ALL: [Board; 4] = [
        Board::Rpi3,
        Board::Imx6ulPico,
        Board::Imx7dPico,
        Board::Esp32S3Devkit,
    ];

    /// Resolve a device identifier (e.g. `"rpi3"`).
    pub fn from_device(device: &str) -> Result<Self, ConfigError> {
        match device {
            DEVICE_RPI3 => Ok(Self::Rpi3),
            DEVICE_IMX6UL_PICO => Ok(Self::Imx6ulPico),
            DEVICE_IMX7D_PICO => Ok(Self::Imx7dPico),
            DEVICE_ESP32S3_DEVKIT => Ok(Self::Esp32S3Devkit),
            _ => {
                log::error!("board: unknown device '{}'", device);
                Err(ConfigError::UnknownBoard)
            }
        }
    }

    pub const fn device(self) -> &'static str {
        match self {
            Self::Rpi3 => DEVICE_RPI3,
            Self::Imx6ulPico => DEVICE_IMX6UL_PICO,
            Self::Imx7dPico => DEVICE_IMX7D_PICO,
            Self::Esp32S3Devkit => DEVICE_ESP32S3_DEVKIT,
        }
    }

    /// GPIO driving the sample LED.
    pub const fn led_gpio(self) -> &'static str {
        match self {
            Self::Rpi3 => "BCM6",
            Self::Imx6ulPico => "GPIO4_IO22",
            Self::Imx7dPico => "GPIO2_IO02",
            Self::Esp32S3Devkit => "GPIO2",
        }
    }

    /// GPIO wired to the push button.
    pub const fn button_gpio(self) -> &'static str {
        match self {
            Self::Rpi3 => "BCM21",
            Self::Imx6ulPico => "GPIO2_IO03",
            Self::Imx7dPico => "GPIO6_IO14",
            Self::Esp32S3Devkit => "GPIO0",
        }
    }

    /// PWM output driving the servo.
    pub const fn pwm_pin(self) -> &'static str {
        match self {
            Self::Rpi3 => "PWM0",
            Self::Imx6ulPico => "PWM7",
            Self::Imx7dPico => "PWM1",
            Self::Esp32S3Devkit => "GPIO4",
        }
    }

    /// I2C bus carrying the sensor and display.
    pub const fn i2c_bus(self) -> &'static str {
        match self {
            Self::Rpi3 => "I2C1",
            Self::Imx6ulPico => "I2C2",
            Self::Imx7dPico => "I2C1",
            Self::Esp32S3Devkit => "I2C0",
        }
    }

    pub const fn pins(self) -> BoardPins {
        BoardPins {
            led_gpio: self.led_gpio(),
            button_gpio: self.button_gpio(),
            pwm: self.pwm_pin(),
            i2c_bus: self.i2c_bus(),
        }
    }
}

impl FromStr for Board {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_device(s)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.device())
    }
}

// ---------------------------------------------------------------------------
// Lookups by device string
// ---------------------------------------------------------------------------

pub fn led_gpio_for(device: &str) -> Result<&'static str, ConfigError> {
    Board::from_device(device).map(Board::led_gpio)
}

pub fn button_gpio_for(device: &str) -> Result<&'static str, ConfigError> {
    Board::from_device(device).map(Board::button_gpio)
}

pub fn pwm_pin_for(device: &str) -> Result<&'static str, ConfigError> {
    Board::from_device(device).map(Board::pwm_pin)
}

pub fn i2c_bus_for(device: &str) -> Result<&'static str, ConfigError> {
    Board::from_device(device).map(Board::i2c_bus)
}
