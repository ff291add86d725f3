//! Shared fixtures for integration tests.
//!
//! The simulator already journals every hardware call; this module adds
//! a key-event recorder and helpers for reading the journal.

use std::sync::{Arc, Mutex};

use pio_samples::adapters::sim::{SimOp, SimPeripherals};
use pio_samples::app::ports::{KeyEvent, KeyEventSink};

// ── Key events ────────────────────────────────────────────────

/// Sink that stores every key event it receives.  Clones share storage.
#[derive(Clone, Default)]
pub struct RecordingKeySink {
    events: Arc<Mutex<Vec<KeyEvent>>>,
}

#[allow(dead_code)]
impl RecordingKeySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<KeyEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl KeyEventSink for RecordingKeySink {
    fn on_key_event(&mut self, event: KeyEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ── Journal helpers ───────────────────────────────────────────

/// Levels written to `pin`, in order.
#[allow(dead_code)]
pub fn writes_to(sim: &SimPeripherals, pin: &str) -> Vec<bool> {
    sim.ops_for(pin)
        .into_iter()
        .filter_map(|op| match op {
            SimOp::SetValue(_, level) => Some(level),
            _ => None,
        })
        .collect()
}

/// Duty cycles written to `pwm`, in order.
#[allow(dead_code)]
pub fn duty_cycles(sim: &SimPeripherals, pwm: &str) -> Vec<f64> {
    sim.ops_for(pwm)
        .into_iter()
        .filter_map(|op| match op {
            SimOp::SetDutyCycle(_, percent) => Some(percent),
            _ => None,
        })
        .collect()
}
