//! Two-phase sample lifecycle.
//!
//! ```text
//!   new() ──▶ initialize() ──▶ (scheduler runs, inputs polled) ──▶ shutdown()
//! ```
//!
//! `initialize` fails only on configuration errors; a hardware error
//! disables the affected subsystem and is logged.  `shutdown` never
//! fails: every close is attempted and collected in the report.

use log::error;

use super::ports::PeriodicTask;
use crate::error::Error;
use crate::scheduler::{Scheduler, ShutdownReport, TaskHandle};

pub trait Sample {
    fn name(&self) -> &'static str;

    /// Open peripherals and register periodic work with `scheduler`.
    fn initialize(&mut self, scheduler: &mut Scheduler) -> Result<(), Error>;

    /// Deliver pending input edges.  Only polled adapters need this.
    fn poll_inputs(&mut self) {}

    /// Stop scheduled work, then close every handle the sample owns.
    fn shutdown(&mut self, scheduler: &mut Scheduler) -> ShutdownReport;
}

/// Cancel, close and release one scheduled task, recording the close.
pub(crate) fn stop_task(
    scheduler: &mut Scheduler,
    handle: Option<TaskHandle>,
    label: &'static str,
    report: &mut ShutdownReport,
) {
    if let Some(handle) = handle {
        scheduler.cancel(&handle);
        report.record(label, scheduler.close_channel(&handle));
        scheduler.release(&handle);
    }
}

/// Hand `task` to the scheduler.  A refused task is closed here so its
/// handle never outlives the failed start.
pub(crate) fn start_or_close<T>(
    scheduler: &mut Scheduler,
    task: T,
    interval_ms: u32,
) -> Option<TaskHandle>
where
    T: PeriodicTask + 'static,
{
    match scheduler.try_start(task, interval_ms) {
        Ok(handle) => Some(handle),
        Err((e, mut task)) => {
            let label = task.label();
            error!("{}: task not started: {}", label, e);
            if let Err(e) = task.close() {
                error!("{}: close failed: {}", label, e);
            }
            None
        }
    }
}
