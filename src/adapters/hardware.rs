//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and the relay bank, exposing them through
//! [`SensorPort`] and [`ActuatorPort`].  This is the only module in the
//! system that touches actual hardware.  On non-espidf targets, the
//! underlying drivers use cfg-gated simulation stubs.

use log::warn;

use crate::app::ports::{Actuator, ActuatorPort, SensorPort};
use crate::drivers::hw_init::GpioOutput;
use crate::drivers::relay::RelayActuator;
use crate::model::{ActuatorId, Reading};
use crate::pins;
use crate::sensors::SensorHub;

/// One actuator per id, looked up by [`ActuatorId`].
pub struct ActuatorSet<A: Actuator> {
    slots: [Option<A>; 4],
}

impl<A: Actuator> Default for ActuatorSet<A> {
    fn default() -> Self {
        Self { slots: [None, None, None, None] }
    }
}

impl<A: Actuator> ActuatorSet<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `actuator` in the slot for its id, replacing any previous one.
    pub fn insert(&mut self, actuator: A) {
        let idx = actuator.id().index();
        self.slots[idx] = Some(actuator);
    }

    pub fn get(&self, id: ActuatorId) -> Option<&A> {
        self.slots[id.index()].as_ref()
    }

    pub fn get_mut(&mut self, id: ActuatorId) -> Option<&mut A> {
        self.slots[id.index()].as_mut()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ActuatorSet<RelayActuator<GpioOutput>> {
    /// The four relays of the chamber board, each driven OFF.
    pub fn chamber_relays(active_low: bool) -> Self {
        let mut set = Self::new();
        for (id, gpio) in ActuatorId::ALL.into_iter().zip(pins::RELAY_GPIOS) {
            let mut relay = RelayActuator::new(id, GpioOutput::new(gpio), active_low);
            relay.begin();
            set.insert(relay);
        }
        set
    }
}

impl<A: Actuator> ActuatorPort for ActuatorSet<A> {
    fn is_on(&self, id: ActuatorId) -> bool {
        self.get(id).is_some_and(Actuator::is_on)
    }

    fn set(&mut self, id: ActuatorId, on: bool) {
        match self.get_mut(id) {
            Some(a) => a.set(on),
            None => warn!("no actuator fitted for {}", id),
        }
    }
}

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<A: Actuator> {
    sensor_hub: SensorHub,
    actuators: ActuatorSet<A>,
}

impl<A: Actuator> HardwareAdapter<A> {
    pub fn new(sensor_hub: SensorHub, actuators: ActuatorSet<A>) -> Self {
        Self { sensor_hub, actuators }
    }

    pub fn sensors_mut(&mut self) -> &mut SensorHub {
        &mut self.sensor_hub
    }

    pub fn actuators(&self) -> &ActuatorSet<A> {
        &self.actuators
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<A: Actuator> SensorPort for HardwareAdapter<A> {
    fn read_all(&mut self, now_ms: u64) -> Reading {
        self.sensor_hub.read_all(now_ms)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<A: Actuator> ActuatorPort for HardwareAdapter<A> {
    fn is_on(&self, id: ActuatorId) -> bool {
        self.actuators.is_on(id)
    }

    fn set(&mut self, id: ActuatorId, on: bool) {
        self.actuators.set(id, on);
    }
}
