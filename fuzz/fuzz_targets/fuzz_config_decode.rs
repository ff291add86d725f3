//! Fuzz target: `SampleConfig` decoding and validation
//!
//! Decodes arbitrary bytes as a postcard-encoded config.  Any config that
//! validates must build an oscillator whose sweep stays within bounds.
//!
//! cargo fuzz run fuzz_config_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use pio_samples::config::SampleConfig;
use pio_samples::drivers::servo::PulseOscillator;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = postcard::from_bytes::<SampleConfig>(data) else {
        return;
    };
    if config.validate().is_err() {
        return;
    }

    let mut osc = PulseOscillator::from_config(&config).expect("validated config");
    let (min, max) = osc.bounds();
    for _ in 0..64 {
        let active = osc.step();
        assert!(active >= min && active <= max, "pulse left its bounds");
        let duty = osc.duty_cycle_percent();
        assert!((0.0..=100.0).contains(&duty), "duty cycle out of range");
    }
});
