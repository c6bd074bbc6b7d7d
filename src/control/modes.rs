//! Actuator mode registry.

use crate::model::{ActuatorId, ControlMode};

/// Per-actuator control mode, indexed by [`ActuatorId::index`].
///
/// Modes change only through an explicit command and are independent of
/// the physical on/off state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRegistry {
    modes: [ControlMode; 4],
}

impl Default for ModeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only copy handed to status endpoints.
pub type ModeSnapshot = ModeRegistry;

impl ModeRegistry {
    /// Everything automatic.
    pub const fn new() -> Self {
        Self {
            modes: [ControlMode::Automatic; 4],
        }
    }

    pub fn get(&self, id: ActuatorId) -> ControlMode {
        self.modes[id.index()]
    }

    /// Returns `true` if the mode actually changed.
    pub fn set(&mut self, id: ActuatorId, mode: ControlMode) -> bool {
        let slot = &mut self.modes[id.index()];
        let changed = *slot != mode;
        *slot = mode;
        changed
    }

    pub fn is_manual(&self, id: ActuatorId) -> bool {
        self.get(id) == ControlMode::Manual
    }

    /// `(id, mode)` pairs in control-pass order.
    pub fn iter(&self) -> impl Iterator<Item = (ActuatorId, ControlMode)> + '_ {
        ActuatorId::ALL.into_iter().map(|id| (id, self.get(id)))
    }
}
