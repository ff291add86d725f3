//! Unified error types for the peripheral samples.
//!
//! A single `Error` enum that every subsystem converts into.  All variants
//! are `Copy` so they can be logged, stored in a shutdown report and
//! returned from a tick without allocation.
//!
//! The taxonomy is deliberately small:
//!
//! | Kind      | Source                         | Handling                      |
//! |-----------|--------------------------------|-------------------------------|
//! | Config    | unknown board, bad parameters  | fatal, surfaced at startup    |
//! | Io        | any hardware call              | logged, subsystem abandoned   |
//! | Scheduler | full task table, zero interval | returned to the caller        |

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid or names an unknown board.
    Config(ConfigError),
    /// A hardware call failed.
    Io(IoError),
    /// The scheduler refused a request.
    Scheduler(SchedulerError),
}

impl Error {
    /// `true` for errors that must abort startup rather than disable one
    /// subsystem.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Scheduler(e) => write!(f, "scheduler: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The board identifier has no pin table.
    UnknownBoard,
    /// A parameter failed validation.  The string names the field.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownBoard => write!(f, "unknown board"),
            Self::Invalid(msg) => write!(f, "invalid parameter: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Hardware I/O errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// The handle was already closed.
    Closed,
    /// No peripheral exists under the requested name.
    NoDevice,
    /// The peripheral is already open elsewhere.
    Busy,
    /// The driver cannot perform the request (e.g. fixed-frequency timer).
    Unsupported,
    /// An argument is outside the range the peripheral accepts.
    InvalidArgument,
    /// Bus or register access failed.
    Bus,
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "handle closed"),
            Self::NoDevice => write!(f, "no such device"),
            Self::Busy => write!(f, "device busy"),
            Self::Unsupported => write!(f, "operation unsupported"),
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::Bus => write!(f, "bus access failed"),
        }
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Scheduler errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// Every task slot is occupied.
    Full,
    /// A repeating task needs a non-zero interval.
    ZeroInterval,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "task table full"),
            Self::ZeroInterval => write!(f, "interval must be non-zero"),
        }
    }
}

impl From<SchedulerError> for Error {
    fn from(e: SchedulerError) -> Self {
        Self::Scheduler(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
