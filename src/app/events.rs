//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log, remote upload).

use crate::control::Transition;
use crate::model::{ActuatorId, ControlMode, Reading, StageId};
use crate::rules::{AlarmLevel, Decision};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service started; carries the stage it will evaluate.
    Started { stage: StageId },

    /// Periodic environment report.
    Telemetry(EnvironmentReport),

    /// An actuator was switched.
    ActuatorChanged(Transition),

    /// An actuator changed between automatic and manual.
    ModeChanged { actuator: ActuatorId, mode: ControlMode },

    /// The evaluated alarm level moved.
    AlarmChanged {
        from: AlarmLevel,
        to: AlarmLevel,
        decision: Decision,
    },

    /// The active stage was replaced.
    StageChanged { from: StageId, to: StageId },

    /// A fresh threshold set was accepted for `stage`.
    ThresholdsReplaced { stage: StageId },

    /// A fetched threshold set failed validation and was dropped.
    ThresholdsRejected { reason: &'static str },
}

/// Environment report for the latest control cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentReport {
    /// ISO-8601 UTC.
    pub timestamp: String,
    /// Stage the decision was evaluated for.
    pub stage: StageId,
    pub decision: Decision,
    pub reading: Reading,
}
