//! Actuator controller.
//!
//! Turns a [`Reading`] plus the current [`ThresholdSet`] (automatic mode) or
//! an explicit request (manual mode) into actuator transitions.  A device is
//! only touched when its desired state differs from its current physical
//! state, and every touch produces exactly one audit record.
//!
//! The controller never caches physical state; it asks the
//! [`ActuatorPort`] every time.

use heapless::Vec;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::hysteresis::{HysteresisMargins, lighting_demand, schmitt, ventilation_demand};
use super::modes::{ModeRegistry, ModeSnapshot};
use crate::app::ports::{ActuatorPort, AuditRecord, AuditSink};
use crate::model::{
    ActuatorId, ControlMode, ControlOrigin, FallbackThresholds, Reading, ResolvedThresholds,
    ThresholdSet,
};

/// Controller tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Substituted per bound when a threshold is unknown.
    pub fallback: FallbackThresholds,
    pub margins: HysteresisMargins,
    /// Lights come on below this illuminance (lux).
    pub lighting_lux_floor: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            fallback: FallbackThresholds::default(),
            margins: HysteresisMargins::default(),
            lighting_lux_floor: 50.0,
        }
    }
}

/// One applied actuator change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub actuator: ActuatorId,
    pub state: bool,
    pub origin: ControlOrigin,
    /// Whether the audit sink accepted the record.
    pub audited: bool,
}

/// Changes made by one automatic pass, in control-pass order.
pub type Transitions = Vec<Transition, 4>;

pub struct Controller {
    config: ControllerConfig,
    modes: ModeRegistry,
}

impl Controller {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            modes: ModeRegistry::new(),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    // ── Mode registry ─────────────────────────────────────────

    /// Switch one actuator between automatic and manual.  Physical state is
    /// left alone.  Returns `true` if the mode changed.
    pub fn set_mode(&mut self, id: ActuatorId, mode: ControlMode) -> bool {
        let changed = self.modes.set(id, mode);
        if changed {
            info!("Mode {} -> {}", id, mode.as_str());
        }
        changed
    }

    pub fn mode(&self, id: ActuatorId) -> ControlMode {
        self.modes.get(id)
    }

    pub fn modes(&self) -> ModeSnapshot {
        self.modes
    }

    // ── Manual override ───────────────────────────────────────

    /// Drive `id` to `desired` if, and only if, it is in manual mode.
    ///
    /// In automatic mode the request is dropped without a trace; manual
    /// requests never switch modes implicitly.
    pub fn apply_manual(
        &mut self,
        id: ActuatorId,
        desired: bool,
        reading: &Reading,
        bank: &mut impl ActuatorPort,
        audit: &mut impl AuditSink,
    ) -> Option<Transition> {
        if !self.modes.is_manual(id) {
            debug!("Manual request for {} ignored (automatic mode)", id);
            return None;
        }
        Self::drive(id, desired, ControlOrigin::Manual, reading, bank, audit)
    }

    // ── Automatic pass ────────────────────────────────────────

    /// Evaluate every automatic-mode actuator in fixed order (ventilation,
    /// heater, humidifier, lighting) and apply the changes.
    pub fn apply_auto(
        &mut self,
        reading: &Reading,
        thresholds: &ThresholdSet,
        bank: &mut impl ActuatorPort,
        audit: &mut impl AuditSink,
    ) -> Transitions {
        let resolved = thresholds.resolve(&self.config.fallback);
        let mut applied = Transitions::new();

        for id in ActuatorId::ALL {
            if self.modes.get(id) != ControlMode::Automatic {
                continue;
            }
            let desired = self.desired_state(id, reading, &resolved, bank.is_on(id));
            if let Some(t) = Self::drive(id, desired, ControlOrigin::Auto, reading, bank, audit) {
                // At most one transition per actuator, so this never overflows.
                let _ = applied.push(t);
            }
        }
        applied
    }

    /// Automatic-mode target for one actuator.
    pub fn desired_state(
        &self,
        id: ActuatorId,
        reading: &Reading,
        thresholds: &ResolvedThresholds,
        currently_on: bool,
    ) -> bool {
        let m = &self.config.margins;
        match id {
            ActuatorId::Ventilation => ventilation_demand(reading, thresholds, m),
            ActuatorId::Heater => schmitt(
                reading.temperature_c,
                thresholds.temperature,
                m.temperature_c,
                currently_on,
            ),
            ActuatorId::Humidifier => schmitt(
                reading.humidity_pct,
                thresholds.humidity,
                m.humidity_pct,
                currently_on,
            ),
            ActuatorId::Lighting => {
                lighting_demand(reading.illuminance_lux, self.config.lighting_lux_floor)
            }
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn drive(
        id: ActuatorId,
        desired: bool,
        origin: ControlOrigin,
        reading: &Reading,
        bank: &mut impl ActuatorPort,
        audit: &mut impl AuditSink,
    ) -> Option<Transition> {
        if bank.is_on(id) == desired {
            return None;
        }
        bank.set(id, desired);
        if bank.is_on(id) != desired {
            log::warn!("{} did not switch, skipping audit", id);
            return None;
        }
        info!(
            "{} -> {} ({})",
            id,
            if desired { "ON" } else { "OFF" },
            origin.as_str()
        );

        let audited = audit.post_audit(&AuditRecord {
            actuator: id,
            origin,
            state: desired,
            reading: *reading,
        });
        if !audited {
            log::warn!("Audit post failed for {}", id);
        }

        Some(Transition {
            actuator: id,
            state: desired,
            origin,
            audited,
        })
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(ControllerConfig::default())
    }
}
