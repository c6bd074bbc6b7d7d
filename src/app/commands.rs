//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (local web
//! endpoint, remote command queue, config poll) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use heapless::Vec;

use super::ports::RemoteCommand;
use crate::model::{ActuatorId, ControlMode, StageId, ThresholdSet};

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Switch an actuator between automatic and manual.
    SetMode { actuator: ActuatorId, mode: ControlMode },

    /// Drive an actuator; honoured only in manual mode.
    ApplyManual { actuator: ActuatorId, on: bool },

    /// Replace the active stage.
    SetStage(StageId),

    /// Replace the threshold set wholesale.
    ReplaceThresholds(ThresholdSet),
}

/// Up to one mode change followed by one manual apply.
pub type CommandBatch = Vec<AppCommand, 2>;

impl AppCommand {
    /// Translate a queued remote command.
    ///
    /// `None` when the actuator id is unknown; the command is then
    /// acknowledged as failed and otherwise ignored.  A mode other than
    /// `auto` / `manual` leaves the mode alone.
    pub fn from_remote(cmd: &RemoteCommand) -> Option<CommandBatch> {
        let actuator = ActuatorId::parse(&cmd.actuator)?;
        let mut batch = CommandBatch::new();
        if let Some(mode) = ControlMode::parse(&cmd.mode) {
            let _ = batch.push(Self::SetMode { actuator, mode });
        }
        let _ = batch.push(Self::ApplyManual {
            actuator,
            on: cmd.state,
        });
        Some(batch)
    }
}
