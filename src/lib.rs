//! Peripheral I/O samples library.
//!
//! Board pin lookup, a cooperative periodic scheduler and small drivers
//! (LED blink, servo sweep, button, temperature sensor, segment display)
//! written against hardware port traits.  The simulator adapter runs
//! everything on the host; the `espidf` feature adds the ESP32-S3 board.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod board;
pub mod config;
pub mod drivers;
pub mod error;
pub mod scheduler;

pub use app::lifecycle::Sample;
pub use board::Board;
pub use config::SampleConfig;
pub use error::{ConfigError, Error, IoError, Result, SchedulerError};
pub use scheduler::{Scheduler, ShutdownReport, TaskHandle};
