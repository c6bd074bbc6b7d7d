//! Actuator identifiers and control modes.

use core::fmt;

/// The four chamber actuators, in control-pass order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorId {
    Ventilation,
    Heater,
    Humidifier,
    Lighting,
}

impl ActuatorId {
    /// Fixed evaluation order of the automatic pass.
    pub const ALL: [ActuatorId; 4] = [
        Self::Ventilation,
        Self::Heater,
        Self::Humidifier,
        Self::Lighting,
    ];

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == id)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ventilation => "ventilation",
            Self::Heater => "heater",
            Self::Humidifier => "humidifier",
            Self::Lighting => "lighting",
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who decides an actuator's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    #[default]
    Automatic,
    Manual,
}

impl ControlMode {
    /// Strict parse of `"auto"` / `"manual"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(Self::Automatic),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Automatic => "auto",
            Self::Manual => "manual",
        }
    }
}

/// Tag attached to every audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOrigin {
    Auto,
    Manual,
}

impl ControlOrigin {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}
