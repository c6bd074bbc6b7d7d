//! Relay channel driver.
//!
//! One relay per actuator.  The driver tracks the logical state (on/off)
//! and maps it onto the coil input according to the board polarity.
//! Most cheap relay boards switch on a LOW input, hence `active_low`.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::Actuator;
use crate::error::ActuatorError;
use crate::model::ActuatorId;

pub struct RelayActuator<P: OutputPin> {
    id: ActuatorId,
    pin: P,
    active_low: bool,
    on: bool,
}

impl<P: OutputPin> RelayActuator<P> {
    pub fn new(id: ActuatorId, pin: P, active_low: bool) -> Self {
        Self { id, pin, active_low, on: false }
    }

    /// Drive the relay to OFF.  Call once after construction.
    pub fn begin(&mut self) {
        if let Err(e) = self.write(false) {
            warn!("relay {}: {}", self.id, e);
        }
    }

    pub fn is_active_low(&self) -> bool {
        self.active_low
    }

    /// On failure the logical state is left as it was.
    fn write(&mut self, on: bool) -> Result<(), ActuatorError> {
        let high = on != self.active_low;
        let res = if high { self.pin.set_high() } else { self.pin.set_low() };
        res.map_err(|_| ActuatorError::GpioWriteFailed)?;
        self.on = on;
        Ok(())
    }
}

impl<P: OutputPin> Actuator for RelayActuator<P> {
    fn id(&self) -> ActuatorId {
        self.id
    }

    fn is_on(&self) -> bool {
        self.on
    }

    fn set(&mut self, on: bool) {
        if let Err(e) = self.write(on) {
            warn!("relay {} -> {}: {}", self.id, if on { "ON" } else { "OFF" }, e);
        }
    }
}
