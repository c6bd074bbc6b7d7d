//! KozaTakip firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod model;
pub mod pins;
pub mod rules;
pub mod scheduler;

// Hardware- and network-facing modules.  On host builds their device
// paths are replaced by cfg-gated simulation stubs.
pub mod adapters;
pub mod control;
pub mod drivers;
pub mod sensors;
