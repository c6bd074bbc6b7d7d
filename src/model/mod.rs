//! Shared data model: the plain values every other layer passes around.
//!
//! Nothing in here performs I/O or holds hidden state.  A [`Reading`] is a
//! point-in-time environment snapshot, a [`ThresholdSet`] is the per-stage
//! band configuration pushed from the remote side, and [`Stage`] /
//! [`ActuatorId`] are the closed identifier sets used on the wire.

pub mod actuator;
pub mod reading;
pub mod stage;
pub mod thresholds;

pub use actuator::{ActuatorId, ControlMode, ControlOrigin};
pub use reading::Reading;
pub use stage::{Stage, StageId, stage_id};
pub use thresholds::{Band, FallbackThresholds, ResolvedThresholds, Setpoints, ThresholdSet};
