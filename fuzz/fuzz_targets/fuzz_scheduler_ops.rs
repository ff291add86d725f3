//! Fuzz target: scheduler operation sequences
//!
//! Interprets each input byte as one scheduler call (start, cancel,
//! close, release, advance) and checks that nothing ticks after it was
//! cancelled and that shutdown leaves no task armed.
//!
//! cargo fuzz run fuzz_scheduler_ops

#![no_main]

use std::cell::Cell;
use std::rc::Rc;

use libfuzzer_sys::fuzz_target;
use pio_samples::IoError;
use pio_samples::app::ports::{PeriodicTask, TickOutcome};
use pio_samples::scheduler::{Scheduler, TaskHandle};

struct Counter {
    open: bool,
    cancelled: Rc<Cell<bool>>,
}

impl PeriodicTask for Counter {
    fn label(&self) -> &'static str {
        "counter"
    }

    fn tick(&mut self) -> Result<TickOutcome, IoError> {
        assert!(!self.cancelled.get(), "tick after cancel");
        if self.open {
            Ok(TickOutcome::Continue)
        } else {
            Ok(TickOutcome::Stop)
        }
    }

    fn close(&mut self) -> Result<(), IoError> {
        self.open = false;
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let mut sched = Scheduler::new();
    let mut handles: Vec<(TaskHandle, Rc<Cell<bool>>)> = Vec::new();

    for &byte in data {
        let arg = usize::from(byte >> 3);
        match byte & 0b111 {
            0 | 1 => {
                let cancelled = Rc::new(Cell::new(false));
                let counter = Counter {
                    open: true,
                    cancelled: cancelled.clone(),
                };
                if let Ok(h) = sched.start(counter, u32::from(byte >> 3)) {
                    handles.push((h, cancelled));
                }
            }
            2 => {
                if let Some((h, flag)) = handles.get(arg % handles.len().max(1)) {
                    sched.cancel(h);
                    flag.set(true);
                }
            }
            3 => {
                if let Some((h, _)) = handles.get(arg % handles.len().max(1)) {
                    let _ = sched.close_channel(h);
                }
            }
            4 => {
                if !handles.is_empty() {
                    let (h, flag) = handles.swap_remove(arg % handles.len());
                    sched.release(&h);
                    flag.set(true);
                }
            }
            _ => {
                sched.advance(arg as u64 * 10);
            }
        }
    }

    sched.shutdown();
    assert_eq!(sched.active_count(), 0);
    assert_eq!(sched.advance(1_000_000), 0);
});
