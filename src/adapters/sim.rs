//! In-memory peripheral simulator.
//!
//! Implements every hardware port on the host.  Each handle records its
//! calls into a shared journal so tests can assert on the full command
//! history, and faults can be injected per pin and operation.
//!
//! ## Dual-target design
//!
//! On hardware: the `hal` adapter drives real pins.
//! On host/test: this simulator tracks state in-memory only.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::app::ports::{
    AlphanumericDisplay, DigitalIo, Direction, Edge, EdgeCallback, I2cPeripherals,
    PeripheralManager, PwmOutput, TemperatureSensor,
};
use crate::error::IoError;

// ── Call record ───────────────────────────────────────────────

/// One recorded hardware call.
#[derive(Debug, Clone, PartialEq)]
pub enum SimOp {
    OpenGpio(String),
    SetDirection(String, Direction),
    SetValue(String, bool),
    SetEdgeTrigger(String, Edge),
    RegisterCallback(String),
    UnregisterCallback(String),
    CloseGpio(String),
    OpenPwm(String),
    SetFrequency(String, f64),
    SetDutyCycle(String, f64),
    SetEnabled(String, bool),
    ClosePwm(String),
    OpenSensor(String),
    RegisterSensor(String),
    ReadSensor(String),
    UnregisterSensor(String),
    CloseSensor(String),
    OpenDisplay(String),
    SetBrightness(String, f32),
    SetDisplayEnabled(String, bool),
    ClearDisplay(String),
    Display(String, String),
    CloseDisplay(String),
}

impl SimOp {
    /// Pin or bus name the call addressed.
    pub fn target(&self) -> &str {
        match self {
            Self::OpenGpio(n)
            | Self::SetDirection(n, _)
            | Self::SetValue(n, _)
            | Self::SetEdgeTrigger(n, _)
            | Self::RegisterCallback(n)
            | Self::UnregisterCallback(n)
            | Self::CloseGpio(n)
            | Self::OpenPwm(n)
            | Self::SetFrequency(n, _)
            | Self::SetDutyCycle(n, _)
            | Self::SetEnabled(n, _)
            | Self::ClosePwm(n)
            | Self::OpenSensor(n)
            | Self::RegisterSensor(n)
            | Self::ReadSensor(n)
            | Self::UnregisterSensor(n)
            | Self::CloseSensor(n)
            | Self::OpenDisplay(n)
            | Self::SetBrightness(n, _)
            | Self::SetDisplayEnabled(n, _)
            | Self::ClearDisplay(n)
            | Self::Display(n, _)
            | Self::CloseDisplay(n) => n,
        }
    }

    fn kind(&self) -> SimOpKind {
        match self {
            Self::OpenGpio(_) | Self::OpenPwm(_) | Self::OpenSensor(_) | Self::OpenDisplay(_) => {
                SimOpKind::Open
            }
            Self::SetDirection(..) => SimOpKind::SetDirection,
            Self::SetValue(..) => SimOpKind::SetValue,
            Self::SetEdgeTrigger(..) => SimOpKind::SetEdgeTrigger,
            Self::RegisterCallback(_) | Self::RegisterSensor(_) => SimOpKind::Register,
            Self::UnregisterCallback(_) | Self::UnregisterSensor(_) => SimOpKind::Unregister,
            Self::CloseGpio(_) | Self::ClosePwm(_) | Self::CloseSensor(_) | Self::CloseDisplay(_) => {
                SimOpKind::Close
            }
            Self::SetFrequency(..) => SimOpKind::SetFrequency,
            Self::SetDutyCycle(..) => SimOpKind::SetDutyCycle,
            Self::SetEnabled(..) | Self::SetDisplayEnabled(..) => SimOpKind::SetEnabled,
            Self::ReadSensor(_) => SimOpKind::Read,
            Self::SetBrightness(..) => SimOpKind::SetBrightness,
            Self::ClearDisplay(_) => SimOpKind::Clear,
            Self::Display(..) => SimOpKind::Display,
        }
    }
}

/// Operation class used for fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimOpKind {
    Open,
    SetDirection,
    SetValue,
    SetEdgeTrigger,
    Register,
    Unregister,
    Close,
    SetFrequency,
    SetDutyCycle,
    SetEnabled,
    Read,
    SetBrightness,
    Clear,
    Display,
    /// Edge polling; checked without a journal entry.
    Poll,
}

// ── Shared state ──────────────────────────────────────────────

#[derive(Default)]
struct SimState {
    ops: Vec<SimOp>,
    faults: HashMap<(String, SimOpKind), IoError>,
    open: Vec<String>,
    levels: HashMap<String, bool>,
    edges: HashMap<String, Edge>,
    callbacks: HashMap<String, EdgeCallback>,
    temperature_c: f32,
}

type Shared = Rc<RefCell<SimState>>;

/// Record `op` and return the injected fault for it, if any.
fn injected(state: &Shared, target: &str, kind: SimOpKind) -> Result<(), IoError> {
    state
        .borrow()
        .faults
        .get(&(target.to_owned(), kind))
        .copied()
        .map_or(Ok(()), Err)
}

fn record(state: &Shared, op: SimOp) -> Result<(), IoError> {
    let fault = injected(state, op.target(), op.kind());
    state.borrow_mut().ops.push(op);
    fault
}

// ── Peripheral manager ────────────────────────────────────────

/// Simulated board.  Cloning shares the same journal.
#[derive(Clone, Default)]
pub struct SimPeripherals {
    state: Shared,
}

impl SimPeripherals {
    pub fn new() -> Self {
        let sim = Self::default();
        sim.state.borrow_mut().temperature_c = 21.5;
        sim
    }

    /// Every call recorded so far.
    pub fn ops(&self) -> Vec<SimOp> {
        self.state.borrow().ops.clone()
    }

    /// Recorded calls addressed to `target`.
    pub fn ops_for(&self, target: &str) -> Vec<SimOp> {
        self.state
            .borrow()
            .ops
            .iter()
            .filter(|op| op.target() == target)
            .cloned()
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&SimOp) -> bool) -> usize {
        self.state.borrow().ops.iter().filter(|op| pred(op)).count()
    }

    pub fn clear_ops(&self) {
        self.state.borrow_mut().ops.clear();
    }

    /// Make every `kind` call on `target` fail with `error` from now on.
    pub fn inject_fault(&self, target: &str, kind: SimOpKind, error: IoError) {
        self.state
            .borrow_mut()
            .faults
            .insert((target.to_owned(), kind), error);
    }

    pub fn clear_fault(&self, target: &str, kind: SimOpKind) {
        self.state
            .borrow_mut()
            .faults
            .remove(&(target.to_owned(), kind));
    }

    pub fn is_open(&self, target: &str) -> bool {
        self.state.borrow().open.iter().any(|n| n == target)
    }

    /// Last level driven on (or fed into) a pin.
    pub fn level(&self, pin: &str) -> Option<bool> {
        self.state.borrow().levels.get(pin).copied()
    }

    pub fn set_temperature(&self, celsius: f32) {
        self.state.borrow_mut().temperature_c = celsius;
    }

    /// Drive an input pin to `level` and deliver the edge if it matches
    /// the configured trigger.  Returns whether a callback ran.
    pub fn drive_input(&self, pin: &str, level: bool) -> bool {
        let callback = {
            let mut s = self.state.borrow_mut();
            let previous = s.levels.insert(pin.to_owned(), level);
            let edge = s.edges.get(pin).copied().unwrap_or(Edge::None);
            if previous == Some(level) || !edge.matches(level) {
                return false;
            }
            s.callbacks.remove(pin)
        };
        let Some(mut callback) = callback else {
            return false;
        };

        // The borrow is released while the callback runs.
        let keep = callback(level);
        let mut s = self.state.borrow_mut();
        if keep && s.open.iter().any(|n| n == pin) && !s.callbacks.contains_key(pin) {
            s.callbacks.insert(pin.to_owned(), callback);
        }
        true
    }

    /// Whether an edge callback is registered on `pin`.
    pub fn has_callback(&self, pin: &str) -> bool {
        self.state.borrow().callbacks.contains_key(pin)
    }

    fn open(&self, op: SimOp) -> Result<String, IoError> {
        let name = op.target().to_owned();
        if self.is_open(&name) {
            self.state.borrow_mut().ops.push(op);
            return Err(IoError::Busy);
        }
        record(&self.state, op)?;
        self.state.borrow_mut().open.push(name.clone());
        Ok(name)
    }
}

fn mark_closed(state: &Shared, name: &str) {
    let mut s = state.borrow_mut();
    s.open.retain(|n| n != name);
    s.callbacks.remove(name);
}

impl PeripheralManager for SimPeripherals {
    type Gpio = SimGpio;
    type Pwm = SimPwm;

    fn open_gpio(&mut self, name: &str) -> Result<SimGpio, IoError> {
        let name = self.open(SimOp::OpenGpio(name.to_owned()))?;
        Ok(SimGpio {
            name,
            direction: None,
            state: self.state.clone(),
        })
    }

    fn open_pwm(&mut self, name: &str) -> Result<SimPwm, IoError> {
        let name = self.open(SimOp::OpenPwm(name.to_owned()))?;
        Ok(SimPwm {
            name,
            state: self.state.clone(),
        })
    }
}

impl I2cPeripherals for SimPeripherals {
    type Sensor = SimSensor;
    type Display = SimDisplay;

    fn open_temperature_sensor(&mut self, bus: &str) -> Result<SimSensor, IoError> {
        let bus = self.open(SimOp::OpenSensor(bus.to_owned()))?;
        Ok(SimSensor {
            bus,
            state: self.state.clone(),
        })
    }

    fn open_segment_display(&mut self, bus: &str) -> Result<SimDisplay, IoError> {
        // Sensor and display share the bus; the display is addressed as
        // its own device.
        let device = format!("{bus}/ht16k33");
        let device = self.open(SimOp::OpenDisplay(device))?;
        Ok(SimDisplay {
            device,
            state: self.state.clone(),
        })
    }
}

// ── GPIO ──────────────────────────────────────────────────────

pub struct SimGpio {
    name: String,
    direction: Option<Direction>,
    state: Shared,
}

impl DigitalIo for SimGpio {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), IoError> {
        record(&self.state, SimOp::SetDirection(self.name.clone(), direction))?;
        self.direction = Some(direction);
        let initial = match direction {
            Direction::In => None,
            Direction::OutInitiallyLow => Some(false),
            Direction::OutInitiallyHigh => Some(true),
        };
        if let Some(level) = initial {
            self.state.borrow_mut().levels.insert(self.name.clone(), level);
        }
        Ok(())
    }

    fn set_value(&mut self, high: bool) -> Result<(), IoError> {
        record(&self.state, SimOp::SetValue(self.name.clone(), high))?;
        if matches!(self.direction, None | Some(Direction::In)) {
            return Err(IoError::Unsupported);
        }
        self.state.borrow_mut().levels.insert(self.name.clone(), high);
        Ok(())
    }

    fn value(&mut self) -> Result<bool, IoError> {
        Ok(self.state.borrow().levels.get(&self.name).copied().unwrap_or(false))
    }

    fn set_edge_trigger(&mut self, edge: Edge) -> Result<(), IoError> {
        record(&self.state, SimOp::SetEdgeTrigger(self.name.clone(), edge))?;
        self.state.borrow_mut().edges.insert(self.name.clone(), edge);
        Ok(())
    }

    fn register_edge_callback(&mut self, callback: EdgeCallback) -> Result<(), IoError> {
        record(&self.state, SimOp::RegisterCallback(self.name.clone()))?;
        self.state
            .borrow_mut()
            .callbacks
            .insert(self.name.clone(), callback);
        Ok(())
    }

    fn unregister_edge_callback(&mut self) {
        let _ = record(&self.state, SimOp::UnregisterCallback(self.name.clone()));
        self.state.borrow_mut().callbacks.remove(&self.name);
    }

    fn poll_edges(&mut self) -> Result<(), IoError> {
        // Edges are delivered by `drive_input`; polling can only fail.
        injected(&self.state, &self.name, SimOpKind::Poll)
    }

    fn close(self) -> Result<(), IoError> {
        // The pin is released even when the close call reports an error.
        let result = record(&self.state, SimOp::CloseGpio(self.name.clone()));
        mark_closed(&self.state, &self.name);
        result
    }
}

// ── PWM ───────────────────────────────────────────────────────

pub struct SimPwm {
    name: String,
    state: Shared,
}

impl PwmOutput for SimPwm {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_frequency_hz(&mut self, hz: f64) -> Result<(), IoError> {
        record(&self.state, SimOp::SetFrequency(self.name.clone(), hz))?;
        if hz > 0.0 {
            Ok(())
        } else {
            Err(IoError::InvalidArgument)
        }
    }

    fn set_duty_cycle_percent(&mut self, percent: f64) -> Result<(), IoError> {
        record(&self.state, SimOp::SetDutyCycle(self.name.clone(), percent))?;
        if (0.0..=100.0).contains(&percent) {
            Ok(())
        } else {
            Err(IoError::InvalidArgument)
        }
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), IoError> {
        record(&self.state, SimOp::SetEnabled(self.name.clone(), enabled))
    }

    fn close(self) -> Result<(), IoError> {
        let result = record(&self.state, SimOp::ClosePwm(self.name.clone()));
        mark_closed(&self.state, &self.name);
        result
    }
}

// ── Temperature sensor ────────────────────────────────────────

pub struct SimSensor {
    bus: String,
    state: Shared,
}

impl TemperatureSensor for SimSensor {
    fn register(&mut self) -> Result<(), IoError> {
        record(&self.state, SimOp::RegisterSensor(self.bus.clone()))
    }

    fn read_celsius(&mut self) -> Result<f32, IoError> {
        record(&self.state, SimOp::ReadSensor(self.bus.clone()))?;
        Ok(self.state.borrow().temperature_c)
    }

    fn unregister(&mut self) {
        let _ = record(&self.state, SimOp::UnregisterSensor(self.bus.clone()));
    }

    fn close(self) -> Result<(), IoError> {
        let result = record(&self.state, SimOp::CloseSensor(self.bus.clone()));
        mark_closed(&self.state, &self.bus);
        result
    }
}

// ── Segment display ───────────────────────────────────────────

pub struct SimDisplay {
    device: String,
    state: Shared,
}

impl AlphanumericDisplay for SimDisplay {
    fn set_brightness(&mut self, level: f32) -> Result<(), IoError> {
        record(&self.state, SimOp::SetBrightness(self.device.clone(), level))
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), IoError> {
        record(
            &self.state,
            SimOp::SetDisplayEnabled(self.device.clone(), enabled),
        )
    }

    fn clear(&mut self) -> Result<(), IoError> {
        record(&self.state, SimOp::ClearDisplay(self.device.clone()))
    }

    fn display(&mut self, text: &str) -> Result<(), IoError> {
        record(
            &self.state,
            SimOp::Display(self.device.clone(), text.to_owned()),
        )
    }

    fn close(self) -> Result<(), IoError> {
        let result = record(&self.state, SimOp::CloseDisplay(self.device.clone()));
        mark_closed(&self.state, &self.device);
        result
    }
}
