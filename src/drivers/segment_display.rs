//! Alphanumeric segment display.
//!
//! One-shot driver: open, configure (brightness, enable, clear any text
//! left from a previous run), write text, close.

use log::info;

use crate::app::ports::{AlphanumericDisplay, I2cPeripherals};
use crate::error::IoError;

pub struct SegmentDisplay<D: AlphanumericDisplay> {
    display: Option<D>,
}

impl<D: AlphanumericDisplay> SegmentDisplay<D> {
    pub fn open<M>(manager: &mut M, bus: &str, brightness: f32) -> Result<Self, IoError>
    where
        M: I2cPeripherals<Display = D>,
    {
        let mut display = manager.open_segment_display(bus)?;
        let configured = display
            .set_brightness(brightness)
            .and_then(|()| display.set_enabled(true))
            .and_then(|()| display.clear());
        if let Err(e) = configured {
            let _ = display.close();
            return Err(e);
        }
        Ok(Self {
            display: Some(display),
        })
    }

    pub fn show(&mut self, text: &str) -> Result<(), IoError> {
        let display = self.display.as_mut().ok_or(IoError::Closed)?;
        display.display(text)?;
        info!("display: showing '{}'", text);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.display.is_some()
    }

    pub fn close(&mut self) -> Result<(), IoError> {
        match self.display.take() {
            Some(display) => display.close(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sim::{SimOp, SimPeripherals};

    #[test]
    fn configures_in_order_then_shows_text() {
        let mut sim = SimPeripherals::new();
        let mut display = SegmentDisplay::open(&mut sim, "I2C1", 1.0).unwrap();
        display.show("ABCD").unwrap();
        display.close().unwrap();

        let dev = "I2C1/ht16k33".to_owned();
        assert_eq!(
            sim.ops(),
            vec![
                SimOp::OpenDisplay(dev.clone()),
                SimOp::SetBrightness(dev.clone(), 1.0),
                SimOp::SetDisplayEnabled(dev.clone(), true),
                SimOp::ClearDisplay(dev.clone()),
                SimOp::Display(dev.clone(), "ABCD".into()),
                SimOp::CloseDisplay(dev),
            ]
        );
    }

    #[test]
    fn show_after_close_fails() {
        let mut sim = SimPeripherals::new();
        let mut display = SegmentDisplay::open(&mut sim, "I2C1", 0.5).unwrap();
        display.close().unwrap();
        assert_eq!(display.show("ABCD"), Err(IoError::Closed));
    }
}
