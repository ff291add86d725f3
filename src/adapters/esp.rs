//! ESP32-S3 peripheral manager for the `esp32s3_devkit` board.
//!
//! Claims the on-board LED, BOOT button and servo pins up front and hands
//! them out through [`PeripheralManager`] wrapped in the `embedded-hal`
//! adapters.  A pin is consumed when opened; reopening it reports
//! [`IoError::Busy`].

use esp_idf_hal::gpio::{AnyIOPin, IOPin, InputOutput, PinDriver};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::sys::EspError;
use esp_idf_hal::units::FromValueType;
use log::{info, warn};

use crate::app::ports::PeripheralManager;
use crate::error::IoError;

use super::hal::{HalGpio, HalPwm};

/// Servo timer rate; the LEDC timer cannot be retuned per request.
pub const SERVO_TIMER_HZ: u32 = 50;

pub type EspGpio = HalGpio<PinDriver<'static, AnyIOPin, InputOutput>>;
pub type EspPwm = HalPwm<LedcDriver<'static>>;

pub struct EspPeripherals {
    gpios: Vec<(&'static str, AnyIOPin)>,
    pwm: Option<(&'static str, LedcDriver<'static>)>,
    claimed: Vec<&'static str>,
}

impl EspPeripherals {
    pub fn new(p: Peripherals) -> Result<Self, EspError> {
        let timer = LedcTimerDriver::new(
            p.ledc.timer0,
            &TimerConfig::new()
                .frequency(SERVO_TIMER_HZ.Hz().into())
                .resolution(Resolution::Bits14),
        )?;
        let servo = LedcDriver::new(p.ledc.channel0, timer, p.pins.gpio4)?;
        info!("esp: LEDC timer0 at {} Hz on GPIO4", SERVO_TIMER_HZ);

        Ok(Self {
            gpios: vec![
                ("GPIO2", p.pins.gpio2.downgrade()),
                ("GPIO0", p.pins.gpio0.downgrade()),
            ],
            pwm: Some(("GPIO4", servo)),
            claimed: Vec::new(),
        })
    }

    fn unavailable(&self, name: &str) -> IoError {
        if self.claimed.iter().any(|n| *n == name) {
            IoError::Busy
        } else {
            warn!("esp: no peripheral named {}", name);
            IoError::NoDevice
        }
    }
}

impl PeripheralManager for EspPeripherals {
    type Gpio = EspGpio;
    type Pwm = EspPwm;

    fn open_gpio(&mut self, name: &str) -> Result<EspGpio, IoError> {
        let Some(index) = self.gpios.iter().position(|(n, _)| *n == name) else {
            return Err(self.unavailable(name));
        };
        let (label, pin) = self.gpios.swap_remove(index);
        self.claimed.push(label);
        let driver = PinDriver::input_output(pin).map_err(|e| {
            warn!("esp: {} driver failed: {}", label, e);
            IoError::Bus
        })?;
        Ok(HalGpio::new(label, driver))
    }

    fn open_pwm(&mut self, name: &str) -> Result<EspPwm, IoError> {
        match self.pwm.take() {
            Some((label, channel)) if label == name => {
                self.claimed.push(label);
                Ok(HalPwm::new(label, channel, f64::from(SERVO_TIMER_HZ)))
            }
            other => {
                self.pwm = other;
                Err(self.unavailable(name))
            }
        }
    }
}
