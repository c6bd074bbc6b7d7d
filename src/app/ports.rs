//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, relays, the remote API, event sinks, storage)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! and the [`Controller`](crate::control::controller::Controller) consume
//! them via generics, so the domain core never touches hardware directly.
//!
//! Collaborator failures never cross this boundary as errors: network calls
//! report a `bool` and fetches return `Option`, and the core carries on.

use crate::config::SystemConfig;
use crate::model::{ActuatorId, ControlOrigin, Reading, StageId, ThresholdSet};

use super::events::{AppEvent, EnvironmentReport};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain a [`Reading`].
pub trait SensorPort {
    /// Read every sensor.  A failed sensor leaves its field unknown; this
    /// never fails as a whole.
    fn read_all(&mut self, now_ms: u64) -> Reading;
}

// ───────────────────────────────────────────────────────────────
// Actuators (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// One on/off device.  The device owns its physical state.
pub trait Actuator {
    fn id(&self) -> ActuatorId;

    fn is_on(&self) -> bool;

    /// Idempotent.
    fn set(&mut self, on: bool);
}

/// Write-side port over the whole actuator bank.
pub trait ActuatorPort {
    fn is_on(&self, id: ActuatorId) -> bool;

    fn set(&mut self, id: ActuatorId, on: bool);

    /// Switch everything off.
    fn all_off(&mut self) {
        for id in ActuatorId::ALL {
            self.set(id, false);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Audit sink (domain → remote API)
// ───────────────────────────────────────────────────────────────

/// One actuator change, with the reading that explains it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuditRecord {
    pub actuator: ActuatorId,
    pub origin: ControlOrigin,
    pub state: bool,
    pub reading: Reading,
}

/// Best-effort audit trail.  `false` means the record was lost; the
/// physical change it describes stands regardless.
pub trait AuditSink {
    fn post_audit(&mut self, record: &AuditRecord) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Remote configuration and commands (remote API → domain)
// ───────────────────────────────────────────────────────────────

/// Source of the active stage and its thresholds.
///
/// `None` means "no answer"; the caller keeps what it already holds.
pub trait RemoteConfigPort {
    fn fetch_active_stage(&mut self) -> Option<StageId>;

    fn fetch_thresholds(&mut self, stage: &str) -> Option<ThresholdSet>;
}

/// A queued command fetched from the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    pub id: u64,
    pub actuator: String,
    /// `"auto"`, `"manual"` or empty.
    pub mode: String,
    pub state: bool,
}

/// Remote command queue.
pub trait CommandSource {
    /// `None` when the queue is empty or the poll failed.
    fn poll_command(&mut self) -> Option<RemoteCommand>;

    fn ack_command(&mut self, id: u64, ok: bool) -> bool;
}

/// Periodic uploads to the remote API.
pub trait TelemetrySink {
    fn post_environment(&mut self, report: &EnvironmentReport) -> bool;

    fn post_heartbeat(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.  Adapters
/// decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    /// Returns [`SystemConfig::default()`] if nothing is stored.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate
// ───────────────────────────────────────────────────────────────

/// Periodic jobs run from the main loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Post the environment report.
    Telemetry,
    /// Fetch and execute one remote command.
    CommandPoll,
    /// Post the device heartbeat.
    Heartbeat,
    /// Refresh the active stage and thresholds.
    ConfigPoll,
}

impl TaskKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Telemetry => "telemetry",
            Self::CommandPoll => "command-poll",
            Self::Heartbeat => "heartbeat",
            Self::ConfigPoll => "config-poll",
        }
    }
}

/// Callback the [`Scheduler`](crate::scheduler::Scheduler) invokes when a
/// task falls due.  The scheduler knows nothing about what the task does.
pub trait SchedulerDelegate {
    fn on_task_due(&mut self, task: TaskKind, now_ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
