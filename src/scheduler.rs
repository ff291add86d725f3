//! Periodic actuator scheduler.
//!
//! Runs independent repeating update cycles for output channels on one
//! logical timeline.  Every task goes through the same cycle:
//!
//! ```text
//!   start() ──▶ Armed(due = now) ──▶ tick() ──┬─▶ Continue ─▶ Armed(due = now + interval)
//!                                             ├─▶ Stop     ─▶ Stopped(ChannelClosed)
//!                                             └─▶ Err(io)  ─▶ Stopped(Failed)   (logged)
//!   cancel() / shutdown() ─────────────────────────────────▶ Stopped(Cancelled)
//! ```
//!
//! The scheduler is single-threaded and cooperative: [`Scheduler::run_due`]
//! dispatches due ticks one at a time, so two ticks never overlap and no
//! locking is needed.  Time is supplied by the caller in milliseconds,
//! which keeps the engine independent of any clock and fully testable.
//!
//! Cancellation is race-free against a tick that is already queued: the
//! liveness token is checked before every tick and again before re-arming,
//! and cancelling drops the pending deadline outright.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};

use crate::app::ports::{PeriodicTask, TickOutcome};
use crate::error::{IoError, SchedulerError};

// ═══════════════════════════════════════════════════════════════
//  Handles
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent tasks (fixed slot table).
pub const MAX_TASKS: usize = 8;

/// Shared liveness flag.  Once cancelled, never live again.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Returned by [`Scheduler::start`].  Cloning shares the same token.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    slot: usize,
    generation: u32,
    token: CancelToken,
}

impl TaskHandle {
    /// Cancel without access to the scheduler.  The next dispatch of the
    /// task sees the token and drops it without touching hardware.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Task state
// ═══════════════════════════════════════════════════════════════

/// Why a task stopped rescheduling itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    /// The task found its handle closed.
    ChannelClosed,
    /// A tick failed; never retried.
    Failed(IoError),
}

/// Externally visible task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Armed { due_ms: u64 },
    Stopped(StopReason),
}

#[derive(Debug, Clone, Copy)]
enum TaskState {
    /// `seq` orders tasks armed for the same instant (FIFO).
    Armed { due_ms: u64, seq: u64 },
    Stopped(StopReason),
}

struct TaskEntry {
    task: Box<dyn PeriodicTask>,
    interval_ms: u32,
    generation: u32,
    token: CancelToken,
    state: TaskState,
    ticks: u64,
}

impl TaskEntry {
    fn stop(&mut self, reason: StopReason) {
        if matches!(self.state, TaskState::Armed { .. }) {
            self.state = TaskState::Stopped(reason);
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Shutdown report
// ═══════════════════════════════════════════════════════════════

/// Result of closing a group of handles.  Every close is attempted even
/// when an earlier one fails.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Handles closed cleanly.
    pub closed: usize,
    /// `(label, error)` for each close that failed.
    pub failures: heapless::Vec<(&'static str, IoError), MAX_TASKS>,
}

impl ShutdownReport {
    /// Record one close attempt, logging a failure.
    pub fn record(&mut self, label: &'static str, result: Result<(), IoError>) {
        match result {
            Ok(()) => self.closed += 1,
            Err(e) => {
                error!("{}: close failed: {}", label, e);
                // More failures than slots only loses the report entry;
                // the error is already logged.
                let _ = self.failures.push((label, e));
            }
        }
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: ShutdownReport) {
        self.closed += other.closed;
        for failure in other.failures {
            let _ = self.failures.push(failure);
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// The scheduler engine.
///
/// Owns every registered [`PeriodicTask`] (and through it each task's
/// hardware handle).  One instance is created per process and passed by
/// reference to each sample.
pub struct Scheduler {
    slots: [Option<TaskEntry>; MAX_TASKS],
    now_ms: u64,
    next_generation: u32,
    next_seq: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
            now_ms: 0,
            next_generation: 0,
            next_seq: 0,
        }
    }

    /// Latest time seen by [`run_due`](Self::run_due).
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Register a repeating task.  Its first tick is due immediately (at
    /// the current time); each later tick is due `interval_ms` after the
    /// previous one completed.
    pub fn start<T>(&mut self, task: T, interval_ms: u32) -> Result<TaskHandle, SchedulerError>
    where
        T: PeriodicTask + 'static,
    {
        self.try_start(task, interval_ms).map_err(|(e, _)| e)
    }

    /// Like [`start`](Self::start), but a refused task is handed back so
    /// the caller can close its handle.
    pub fn try_start<T>(
        &mut self,
        task: T,
        interval_ms: u32,
    ) -> Result<TaskHandle, (SchedulerError, T)>
    where
        T: PeriodicTask + 'static,
    {
        if interval_ms == 0 {
            return Err((SchedulerError::ZeroInterval, task));
        }
        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            warn!("Scheduler: no free slot for '{}'", task.label());
            return Err((SchedulerError::Full, task));
        };

        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        let seq = self.bump_seq();
        let token = CancelToken::new();

        info!(
            "Scheduler: started '{}' at slot {} (every {} ms)",
            task.label(),
            slot,
            interval_ms
        );
        self.slots[slot] = Some(TaskEntry {
            task: Box::new(task),
            interval_ms,
            generation,
            token: token.clone(),
            state: TaskState::Armed {
                due_ms: self.now_ms,
                seq,
            },
            ticks: 0,
        });

        Ok(TaskHandle {
            slot,
            generation,
            token,
        })
    }

    /// Prevent any future tick of the task, including one already queued.
    /// Idempotent, and safe on a task that already stopped or failed.
    pub fn cancel(&mut self, handle: &TaskHandle) {
        handle.token.cancel();
        if let Some(entry) = self.entry_mut(handle) {
            if matches!(entry.state, TaskState::Armed { .. }) {
                info!("Scheduler: cancelled '{}'", entry.task.label());
            }
            entry.stop(StopReason::Cancelled);
        }
    }

    /// Close the task's handle while leaving any queued tick in place.  The
    /// next tick finds the handle gone and stops without touching hardware.
    /// A released task has nothing left to close.
    pub fn close_channel(&mut self, handle: &TaskHandle) -> Result<(), IoError> {
        match self.entry_mut(handle) {
            Some(entry) => entry.task.close(),
            None => {
                debug!("Scheduler: close on released task ignored");
                Ok(())
            }
        }
    }

    /// Free slots left in the task table.
    pub fn free_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// Drop the task from its slot.  The caller must have closed it.
    pub fn release(&mut self, handle: &TaskHandle) {
        handle.token.cancel();
        if let Some(slot) = self.slots.get_mut(handle.slot) {
            if slot
                .as_ref()
                .is_some_and(|e| e.generation == handle.generation)
            {
                *slot = None;
            }
        }
    }

    /// Dispatch every tick due at or before `now_ms`, one at a time.
    /// Returns the number of ticks run.
    ///
    /// Time never moves backwards: an older `now_ms` is ignored.
    pub fn run_due(&mut self, now_ms: u64) -> usize {
        self.now_ms = self.now_ms.max(now_ms);
        let now = self.now_ms;

        let mut ran = 0;
        while let Some(slot) = self.next_due_slot(now) {
            if self.dispatch(slot, now) {
                ran += 1;
            }
        }
        ran
    }

    /// Move the timeline forward by `by_ms` and dispatch what became due.
    pub fn advance(&mut self, by_ms: u64) -> usize {
        self.run_due(self.now_ms.saturating_add(by_ms))
    }

    /// Earliest pending deadline, if any task is armed.
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots
            .iter()
            .flatten()
            .filter_map(|e| match e.state {
                TaskState::Armed { due_ms, .. } => Some(due_ms),
                TaskState::Stopped(_) => None,
            })
            .min()
    }

    pub fn status(&self, handle: &TaskHandle) -> Option<TaskStatus> {
        self.entry(handle).map(|e| match e.state {
            TaskState::Armed { due_ms, .. } => TaskStatus::Armed { due_ms },
            TaskState::Stopped(reason) => TaskStatus::Stopped(reason),
        })
    }

    /// Completed ticks of the task.
    pub fn tick_count(&self, handle: &TaskHandle) -> Option<u64> {
        self.entry(handle).map(|e| e.ticks)
    }

    /// Number of tasks still armed.
    pub fn active_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|e| matches!(e.state, TaskState::Armed { .. }))
            .count()
    }

    /// Stop everything: drop all queued ticks, then close every handle
    /// (one failure never skips the rest), then release the tasks.
    pub fn shutdown(&mut self) -> ShutdownReport {
        for entry in self.slots.iter_mut().flatten() {
            entry.token.cancel();
            entry.stop(StopReason::Cancelled);
        }

        let mut report = ShutdownReport::default();
        for entry in self.slots.iter_mut().flatten() {
            let label = entry.task.label();
            report.record(label, entry.task.close());
        }

        for slot in &mut self.slots {
            *slot = None;
        }
        info!(
            "Scheduler: shutdown complete ({} closed, {} failed)",
            report.closed,
            report.failures.len()
        );
        report
    }

    // ── Internal ──────────────────────────────────────────────

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn entry(&self, handle: &TaskHandle) -> Option<&TaskEntry> {
        self.slots
            .get(handle.slot)?
            .as_ref()
            .filter(|e| e.generation == handle.generation)
    }

    fn entry_mut(&mut self, handle: &TaskHandle) -> Option<&mut TaskEntry> {
        self.slots
            .get_mut(handle.slot)?
            .as_mut()
            .filter(|e| e.generation == handle.generation)
    }

    fn next_due_slot(&self, now_ms: u64) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot.as_ref()?.state {
                TaskState::Armed { due_ms, seq } if due_ms <= now_ms => Some((due_ms, seq, i)),
                _ => None,
            })
            .min()
            .map(|(_, _, i)| i)
    }

    /// Run one tick.  Returns whether the task's `tick` was invoked.
    fn dispatch(&mut self, slot: usize, now_ms: u64) -> bool {
        let seq = self.bump_seq();
        let Some(entry) = self.slots[slot].as_mut() else {
            return false;
        };
        let label = entry.task.label();

        if entry.token.is_cancelled() {
            debug!("Scheduler: dropping queued tick of cancelled '{}'", label);
            entry.stop(StopReason::Cancelled);
            return false;
        }

        match entry.task.tick() {
            Ok(TickOutcome::Continue) => {
                entry.ticks += 1;
                if entry.token.is_cancelled() {
                    entry.stop(StopReason::Cancelled);
                } else {
                    entry.state = TaskState::Armed {
                        due_ms: now_ms.saturating_add(u64::from(entry.interval_ms)),
                        seq,
                    };
                }
            }
            Ok(TickOutcome::Stop) => {
                info!("Scheduler: '{}' stopped, channel closed", label);
                entry.stop(StopReason::ChannelClosed);
            }
            Err(e) => {
                error!("Scheduler: '{}' failed: {} (not rescheduled)", label, e);
                entry.stop(StopReason::Failed(e));
            }
        }
        true
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
