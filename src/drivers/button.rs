//! Push-button drivers.
//!
//! Two flavours, both interrupt-style rather than polled tasks:
//!
//! - [`ButtonListener`] — raw GPIO input with a falling-edge callback that
//!   logs each press and keeps listening.  No debouncing.
//! - [`ButtonInputDriver`] — turns press/release edges into key events for
//!   a [`KeyEventSink`], honouring the wiring's [`LogicState`].
//!
//! Neither goes through the scheduler: the callback is unregistered when
//! the pin is closed.
//!
//! ## Hardware
//!
//! Pull-up wiring reads LOW while pressed, so a press is a falling edge.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use log::info;

use crate::app::ports::{
    DigitalIo, Direction, Edge, KeyAction, KeyEvent, KeyEventSink, PeripheralManager,
};
use crate::error::IoError;

/// Configure `pin` as an edge-triggered input, closing it on failure.
fn open_input<M: PeripheralManager>(
    manager: &mut M,
    pin: &str,
    edge: Edge,
) -> Result<M::Gpio, IoError> {
    let mut gpio = manager.open_gpio(pin)?;
    let configured = gpio
        .set_direction(Direction::In)
        .and_then(|()| gpio.set_edge_trigger(edge));
    if let Err(e) = configured {
        let _ = gpio.close();
        return Err(e);
    }
    Ok(gpio)
}

// ═══════════════════════════════════════════════════════════════
//  Falling-edge listener
// ═══════════════════════════════════════════════════════════════

pub struct ButtonListener<G: DigitalIo> {
    gpio: Option<G>,
    /// Written by the edge callback, read by the owner.
    presses: Arc<AtomicU32>,
}

impl<G: DigitalIo> ButtonListener<G> {
    pub fn open<M>(manager: &mut M, pin: &str) -> Result<Self, IoError>
    where
        M: PeripheralManager<Gpio = G>,
    {
        let mut gpio = open_input(manager, pin, Edge::Falling)?;

        let presses = Arc::new(AtomicU32::new(0));
        let counter = presses.clone();
        let registered = gpio.register_edge_callback(Box::new(move |_level| {
            info!("button: GPIO changed, button pressed");
            counter.fetch_add(1, Ordering::Relaxed);
            // Keep listening.
            true
        }));
        if let Err(e) = registered {
            let _ = gpio.close();
            return Err(e);
        }

        Ok(Self {
            gpio: Some(gpio),
            presses,
        })
    }

    /// Presses seen since open.
    pub fn presses(&self) -> u32 {
        self.presses.load(Ordering::Relaxed)
    }

    pub fn is_open(&self) -> bool {
        self.gpio.is_some()
    }

    /// Let a polled adapter deliver pending edges.
    pub fn poll(&mut self) -> Result<(), IoError> {
        match self.gpio.as_mut() {
            Some(gpio) => gpio.poll_edges(),
            None => Ok(()),
        }
    }

    /// Unregister the callback and release the pin.  Idempotent.
    pub fn close(&mut self) -> Result<(), IoError> {
        let Some(mut gpio) = self.gpio.take() else {
            return Ok(());
        };
        gpio.unregister_edge_callback();
        gpio.close()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Key-event driver
// ═══════════════════════════════════════════════════════════════

/// How the button is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicState {
    /// Pull-down resistor: HIGH while pressed.
    PressedWhenHigh,
    /// Pull-up resistor: LOW while pressed.
    PressedWhenLow,
}

impl LogicState {
    pub const fn is_pressed(self, level: bool) -> bool {
        match self {
            Self::PressedWhenHigh => level,
            Self::PressedWhenLow => !level,
        }
    }
}

/// Button that reports presses as key events.
///
/// Open with [`ButtonInputDriver::open`], then [`register`](Self::register)
/// a sink; events flow until [`close`](Self::close).
pub struct ButtonInputDriver<G: DigitalIo> {
    gpio: Option<G>,
    logic: LogicState,
    key_code: u16,
    pressed: Arc<AtomicBool>,
}

impl<G: DigitalIo> ButtonInputDriver<G> {
    pub fn open<M>(
        manager: &mut M,
        pin: &str,
        logic: LogicState,
        key_code: u16,
    ) -> Result<Self, IoError>
    where
        M: PeripheralManager<Gpio = G>,
    {
        let gpio = open_input(manager, pin, Edge::Both)?;
        Ok(Self {
            gpio: Some(gpio),
            logic,
            key_code,
            pressed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start delivering key events to `sink`.
    pub fn register<S>(&mut self, mut sink: S) -> Result<(), IoError>
    where
        S: KeyEventSink + 'static,
    {
        let gpio = self.gpio.as_mut().ok_or(IoError::Closed)?;
        let logic = self.logic;
        let code = self.key_code;
        // Start from the current level so the first edge is judged correctly.
        self.pressed.store(logic.is_pressed(gpio.value()?), Ordering::Release);
        let pressed = self.pressed.clone();

        gpio.register_edge_callback(Box::new(move |level| {
            let now_pressed = logic.is_pressed(level);
            // Repeated edges in the same state carry no new key event.
            if pressed.swap(now_pressed, Ordering::AcqRel) != now_pressed {
                let action = if now_pressed {
                    KeyAction::Down
                } else {
                    KeyAction::Up
                };
                sink.on_key_event(KeyEvent { code, action });
            }
            true
        }))?;
        info!("button: key driver registered (code {})", code);
        Ok(())
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed.load(Ordering::Acquire)
    }

    pub fn key_code(&self) -> u16 {
        self.key_code
    }

    pub fn poll(&mut self) -> Result<(), IoError> {
        match self.gpio.as_mut() {
            Some(gpio) => gpio.poll_edges(),
            None => Ok(()),
        }
    }

    /// Unregister from the host; presses no longer generate key events.
    pub fn close(&mut self) -> Result<(), IoError> {
        let Some(mut gpio) = self.gpio.take() else {
            return Ok(());
        };
        gpio.unregister_edge_callback();
        gpio.close()
    }
}
