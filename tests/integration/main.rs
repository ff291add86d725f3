//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one sample end to end
//! against the in-memory simulator.  All tests run on the host with no
//! real hardware required.

mod driver_samples_tests;
mod mock_hw;
mod pio_lifecycle_tests;
