//! Property tests for the pulse oscillator and the scheduler.
//!
//! Runs on host only — proptest is not available for ESP32 targets.

#![cfg(not(target_os = "espidf"))]

use pio_samples::IoError;
use pio_samples::app::ports::{PeriodicTask, TickOutcome};
use pio_samples::drivers::servo::PulseOscillator;
use pio_samples::scheduler::Scheduler;
use proptest::prelude::*;

/// Oscillator parameters with `0 <= min <= max <= period` and `step > 0`.
fn arb_oscillator() -> impl Strategy<Value = PulseOscillator> {
    (0.0f64..5.0, 0.0f64..5.0, 0.01f64..2.0, 0.0f64..20.0).prop_map(|(min, span, step, slack)| {
        let max = min + span;
        PulseOscillator::new(min, max, step, max + slack + 1.0).unwrap()
    })
}

// ── Pulse oscillator ──────────────────────────────────────────

proptest! {
    /// The active duration never leaves the configured bounds.
    #[test]
    fn active_duration_stays_in_bounds(mut osc in arb_oscillator(), steps in 1usize..200) {
        let (min, max) = osc.bounds();
        for _ in 0..steps {
            let active = osc.step();
            prop_assert!(active >= min && active <= max, "{active} outside [{min}, {max}]");
        }
    }

    /// Direction only flips on a step that lands exactly on a bound.
    #[test]
    fn direction_flips_only_at_bounds(mut osc in arb_oscillator(), steps in 1usize..200) {
        let (min, max) = osc.bounds();
        for _ in 0..steps {
            let before = osc.is_increasing();
            let active = osc.step();
            if osc.is_increasing() != before {
                let at_bound = if before { active == max } else { active == min };
                prop_assert!(at_bound, "flipped at {active}, bounds [{min}, {max}]");
            }
        }
    }

    /// Duty cycle is always `100 * active / period`, within 0..=100.
    #[test]
    fn duty_cycle_tracks_active_duration(mut osc in arb_oscillator(), steps in 0usize..50) {
        for _ in 0..steps {
            osc.step();
        }
        let duty = osc.duty_cycle_percent();
        let want = 100.0 * osc.active_ms() / osc.period_ms();
        prop_assert!((duty - want).abs() < 1e-9);
        prop_assert!((0.0..=100.0).contains(&duty));
    }
}

// ── Scheduler ─────────────────────────────────────────────────

struct CountingTask(std::rc::Rc<std::cell::Cell<u32>>);

impl PeriodicTask for CountingTask {
    fn label(&self) -> &'static str {
        "count"
    }

    fn tick(&mut self) -> Result<TickOutcome, IoError> {
        self.0.set(self.0.get() + 1);
        Ok(TickOutcome::Continue)
    }

    fn close(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}

proptest! {
    /// Polled every millisecond, a task ticks once immediately and then
    /// once per elapsed interval; after cancel it never ticks again.
    #[test]
    fn tick_count_matches_elapsed_intervals(interval in 1u32..500, total in 0u64..3000) {
        let ticks = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut sched = Scheduler::new();
        let handle = sched.start(CountingTask(ticks.clone()), interval).unwrap();

        for now in 0..=total {
            sched.run_due(now);
        }
        let expected = 1 + total / u64::from(interval);
        prop_assert_eq!(u64::from(ticks.get()), expected);

        sched.cancel(&handle);
        let before = ticks.get();
        sched.advance(10 * u64::from(interval));
        prop_assert_eq!(ticks.get(), before);
    }

    /// Coarse polling can only delay ticks, never add extra ones.
    #[test]
    fn coarse_polling_never_over_ticks(
        interval in 1u32..500,
        increments in proptest::collection::vec(0u64..300, 1..50),
    ) {
        let ticks = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut sched = Scheduler::new();
        sched.start(CountingTask(ticks.clone()), interval).unwrap();

        let mut now = 0u64;
        sched.run_due(now);
        for inc in &increments {
            now += inc;
            sched.run_due(now);
            prop_assert!(u64::from(ticks.get()) <= 1 + now / u64::from(interval));
        }
    }
}
