//! Application core: domain orchestration, zero direct I/O.
//!
//! This module wires the rule engine and the controller into one control
//! cycle, translates inbound commands and emits structured events.  All
//! interaction with hardware and the network happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod inbox;
pub mod ports;
pub mod service;
