//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the rule engine, the controller and the in-memory
//! stage / threshold state.  It exposes a hardware-agnostic API; all I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │        AppService         │
//! ActuatorPort ◀──│  RuleEngine · Controller  │ ──▶ AuditSink
//!                 └──────────────────────────┘
//!                      ▲ RemoteConfigPort
//! ```

use log::{info, warn};

use crate::config::SystemConfig;
use crate::control::{Controller, ModeSnapshot};
use crate::model::{Reading, Stage, StageId, ThresholdSet};
use crate::rules::Decision;
use crate::rules::engine::RuleEngine;

use super::commands::AppCommand;
use super::events::{AppEvent, EnvironmentReport};
use super::ports::{ActuatorPort, AuditSink, EventSink, RemoteCommand, RemoteConfigPort, SensorPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    engine: RuleEngine,
    controller: Controller,
    /// Evaluated and reported while no stage has been assigned.
    default_stage: StageId,
    /// Stage assigned by the remote config, if any.
    stage: Option<StageId>,
    /// All unknown until the first successful fetch.
    thresholds: ThresholdSet,
    last_reading: Reading,
    last_decision: Decision,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            engine: RuleEngine::new(config.rule_config()),
            controller: Controller::new(config.controller_config()),
            default_stage: config.default_stage.clone(),
            stage: None,
            thresholds: ThresholdSet::default(),
            last_reading: Reading::default(),
            last_decision: Decision::default(),
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.engine.reset();
        let stage = self.active_stage_id().clone();
        info!("AppService started, stage {}", stage);
        sink.emit(&AppEvent::Started { stage });
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle: read sensors → evaluate → auto pass.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`]; this avoids a double mutable borrow while keeping
    /// the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        audit: &mut impl AuditSink,
        sink: &mut impl EventSink,
    ) -> Decision {
        self.tick_count += 1;

        // 1. Read sensors via SensorPort
        let reading = hw.read_all(now_ms);

        // 2. Classify (policy / telemetry only)
        let stage = self.evaluated_stage();
        let decision = self.engine.evaluate(stage, &reading, now_ms);
        if decision.level != self.last_decision.level {
            sink.emit(&AppEvent::AlarmChanged {
                from: self.last_decision.level,
                to: decision.level,
                decision,
            });
        }

        // 3. Automatic actuator pass
        let transitions = self
            .controller
            .apply_auto(&reading, &self.thresholds, hw, audit);
        for t in transitions {
            sink.emit(&AppEvent::ActuatorChanged(t));
        }

        self.last_reading = reading;
        self.last_decision = decision;
        decision
    }

    // ── Command handling ──────────────────────────────────────

    /// Process one inbound command.  Manual applies use the most recent
    /// reading as audit context.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        bank: &mut impl ActuatorPort,
        audit: &mut impl AuditSink,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::SetMode { actuator, mode } => {
                if self.controller.set_mode(actuator, mode) {
                    sink.emit(&AppEvent::ModeChanged { actuator, mode });
                }
            }
            AppCommand::ApplyManual { actuator, on } => {
                let reading = self.last_reading;
                if let Some(t) = self
                    .controller
                    .apply_manual(actuator, on, &reading, bank, audit)
                {
                    sink.emit(&AppEvent::ActuatorChanged(t));
                }
            }
            AppCommand::SetStage(id) => self.set_stage(id, sink),
            AppCommand::ReplaceThresholds(set) => {
                self.replace_thresholds(set, sink);
            }
        }
    }

    /// Execute a command from the remote queue.  Returns the acknowledgement
    /// flag: `true` iff the actuator id was recognised.
    pub fn handle_remote_command(
        &mut self,
        cmd: &RemoteCommand,
        bank: &mut impl ActuatorPort,
        audit: &mut impl AuditSink,
        sink: &mut impl EventSink,
    ) -> bool {
        let Some(batch) = AppCommand::from_remote(cmd) else {
            warn!("Remote command {} names unknown actuator {:?}", cmd.id, cmd.actuator);
            return false;
        };
        for c in batch {
            self.handle_command(c, bank, audit, sink);
        }
        true
    }

    // ── Remote configuration ──────────────────────────────────

    /// Refresh the active stage, then the thresholds for it.
    ///
    /// Anything the remote side does not answer is kept as it was.
    /// Returns `true` when both the stage and an acceptable threshold set
    /// were fetched.
    pub fn refresh_config(
        &mut self,
        remote: &mut impl RemoteConfigPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let stage_ok = match remote.fetch_active_stage() {
            Some(id) => {
                self.set_stage(id, sink);
                true
            }
            None => {
                warn!("Active stage fetch failed, keeping {}", self.active_stage_id());
                false
            }
        };

        let stage = self.active_stage_id().clone();
        let thresholds_ok = match remote.fetch_thresholds(&stage) {
            Some(set) => self.replace_thresholds(set, sink),
            None => {
                warn!("Threshold fetch for {} failed, keeping previous set", stage);
                false
            }
        };

        stage_ok && thresholds_ok
    }

    fn set_stage(&mut self, id: StageId, sink: &mut impl EventSink) {
        if self.stage.as_ref() == Some(&id) {
            return;
        }
        let from = self.active_stage_id().clone();
        if Stage::parse(&id).is_none() {
            warn!("Stage {} is not known; rules will not fire", id);
        }
        info!("Stage {} -> {}", from, id);
        self.stage = Some(id.clone());
        sink.emit(&AppEvent::StageChanged { from, to: id });
    }

    /// Validate and install a threshold set.  A set whose present bounds
    /// are out of order is dropped and the previous one kept.
    fn replace_thresholds(&mut self, set: ThresholdSet, sink: &mut impl EventSink) -> bool {
        if let Err(reason) = set.validate() {
            warn!("Rejected threshold set: {}", reason);
            sink.emit(&AppEvent::ThresholdsRejected { reason });
            return false;
        }
        let set = set.with_derived_optima();
        if set != self.thresholds {
            self.thresholds = set;
            sink.emit(&AppEvent::ThresholdsReplaced {
                stage: self.active_stage_id().clone(),
            });
        }
        true
    }

    // ── Queries ───────────────────────────────────────────────

    /// Environment report for the latest cycle.
    pub fn build_report(&self, timestamp: String) -> EnvironmentReport {
        EnvironmentReport {
            timestamp,
            stage: self.active_stage_id().clone(),
            decision: self.last_decision,
            reading: self.last_reading,
        }
    }

    pub fn modes(&self) -> ModeSnapshot {
        self.controller.modes()
    }

    /// Held stage id, or the configured default when none is held.
    pub fn active_stage_id(&self) -> &StageId {
        self.stage.as_ref().unwrap_or(&self.default_stage)
    }

    /// The stage the rules are evaluated for; `None` for an unknown id.
    pub fn evaluated_stage(&self) -> Option<Stage> {
        Stage::parse(self.active_stage_id())
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    pub fn last_reading(&self) -> &Reading {
        &self.last_reading
    }

    pub fn last_decision(&self) -> &Decision {
        &self.last_decision
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
