//! Temperature sensor monitor.
//!
//! Opens the I2C sensor, registers it with the host, then reports a
//! reading on every scheduler tick.  Closing unregisters the sensor
//! before releasing the bus device.

use log::{info, warn};

use crate::app::ports::{I2cPeripherals, PeriodicTask, TemperatureSensor, TickOutcome};
use crate::error::IoError;

pub struct TemperatureMonitor<S: TemperatureSensor> {
    sensor: Option<S>,
    last_celsius: Option<f32>,
}

impl<S: TemperatureSensor> TemperatureMonitor<S> {
    pub fn open<M>(manager: &mut M, bus: &str) -> Result<Self, IoError>
    where
        M: I2cPeripherals<Sensor = S>,
    {
        let mut sensor = manager.open_temperature_sensor(bus)?;
        if let Err(e) = sensor.register() {
            let _ = sensor.close();
            return Err(e);
        }
        info!("temperature: sensor registered on {}", bus);
        Ok(Self {
            sensor: Some(sensor),
            last_celsius: None,
        })
    }

    /// Take one reading.
    pub fn read(&mut self) -> Result<f32, IoError> {
        let sensor = self.sensor.as_mut().ok_or(IoError::Closed)?;
        let celsius = sensor.read_celsius()?;
        self.on_sensor_changed(celsius);
        Ok(celsius)
    }

    fn on_sensor_changed(&mut self, celsius: f32) {
        if self.last_celsius != Some(celsius) {
            info!("temperature: changed to {:.2} \u{00b0}C", celsius);
        }
        self.last_celsius = Some(celsius);
    }

    pub fn last_celsius(&self) -> Option<f32> {
        self.last_celsius
    }
}

impl<S: TemperatureSensor> PeriodicTask for TemperatureMonitor<S> {
    fn label(&self) -> &'static str {
        "temperature"
    }

    fn tick(&mut self) -> Result<TickOutcome, IoError> {
        if self.sensor.is_none() {
            warn!("temperature: sensor already closed, stopping");
            return Ok(TickOutcome::Stop);
        }
        self.read()?;
        Ok(TickOutcome::Continue)
    }

    fn close(&mut self) -> Result<(), IoError> {
        let Some(mut sensor) = self.sensor.take() else {
            return Ok(());
        };
        sensor.unregister();
        sensor.close()
    }
}
