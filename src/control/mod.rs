//! Actuator control: hysteresis demand functions, the mode registry and the
//! controller that applies both to the actuator bank.

pub mod controller;
pub mod hysteresis;
pub mod modes;

pub use controller::{Controller, ControllerConfig, Transition, Transitions};
pub use hysteresis::HysteresisMargins;
pub use modes::{ModeRegistry, ModeSnapshot};
