//! Application core: sample lifecycles over the port traits.
//!
//! Samples own their peripherals through a [`ports::PeripheralManager`]
//! (or [`ports::I2cPeripherals`]) and register repeating work with the
//! [`Scheduler`](crate::scheduler::Scheduler).  Nothing here touches a
//! concrete driver, so every sample runs against the simulator in tests.

pub mod driver_samples;
pub mod lifecycle;
pub mod pio;
pub mod ports;
