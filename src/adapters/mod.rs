//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter | Implements                          | Connects to                 |
//! |---------|-------------------------------------|-----------------------------|
//! | `sim`   | PeripheralManager, I2cPeripherals   | In-memory journal (host)    |
//! | `hal`   | DigitalIo, PwmOutput                | Any `embedded-hal` 1.0 pin  |
//! | `esp`   | PeripheralManager                   | ESP32-S3 GPIO + LEDC        |
//! | `clock` | —                                   | esp_timer / `Instant`       |

pub mod clock;
#[cfg(feature = "espidf")]
pub mod esp;
pub mod hal;
pub mod sim;
