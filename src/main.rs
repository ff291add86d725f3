//! Peripheral I/O sample firmware — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  EspPeripherals (GPIO2 LED · GPIO0 button · GPIO4)   │
//! │  ───────────── Port trait boundary ──────────────    │
//! │  PioSample ── LedBlinker · ButtonListener · Servo    │
//! │  Scheduler ◀── MonotonicClock                        │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The loop dispatches due ticks, polls the button for edges, then sleeps
//! until the next deadline (capped so button polling stays responsive).

#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::peripherals::Peripherals;
use log::{error, info};

use pio_samples::adapters::clock::MonotonicClock;
use pio_samples::adapters::esp::EspPeripherals;
use pio_samples::app::pio::PioSample;
use pio_samples::{Sample, SampleConfig, Scheduler};

const BOARD: &str = "esp32s3_devkit";

/// Longest sleep between button polls.
const POLL_INTERVAL_MS: u64 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  pio-samples v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let manager = EspPeripherals::new(peripherals)?;

    // ── 3. Sample bring-up ────────────────────────────────────
    let config = SampleConfig::default();
    let mut scheduler = Scheduler::new();
    let mut sample =
        PioSample::for_device(BOARD, manager, config).map_err(pio_samples::Error::from)?;
    if let Err(e) = sample.initialize(&mut scheduler) {
        error!("{}: startup failed: {}", sample.name(), e);
        return Err(e.into());
    }
    info!("{}: running on {}", sample.name(), sample.board());

    // ── 4. Main loop ──────────────────────────────────────────
    let clock = MonotonicClock::new();
    loop {
        let now = clock.uptime_ms();
        scheduler.run_due(now);
        sample.poll_inputs();

        let wait = scheduler
            .next_deadline()
            .map_or(POLL_INTERVAL_MS, |due| due.saturating_sub(now))
            .clamp(1, POLL_INTERVAL_MS);
        std::thread::sleep(Duration::from_millis(wait));
    }
}
