//! Interval scheduler for the periodic network jobs.
//!
//! The control cycle runs every loop iteration; everything slower
//! (environment report, command poll, heartbeat, config refresh) is a
//! [`PeriodicTask`] here.  The scheduler notifies a [`SchedulerDelegate`]
//! when a task falls due and knows nothing about what the task does.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Telemetry   CommandPoll   Heartbeat   ConfigPoll        │
//! │      │            │            │            │            │
//! │      ▼            ▼            ▼            ▼            │
//! │  ┌────────────────────────────────────────────────────┐  │
//! │  │       Scheduler::tick(now_ms)                      │  │
//! │  │       fires when now − last ≥ interval             │  │
//! │  └──────────────────────┬─────────────────────────────┘  │
//! │                         ▼                                │
//! │                 SchedulerDelegate                        │
//! │       (main loop calls the API client / AppService)      │
//! └──────────────────────────────────────────────────────────┘
//! ```

use log::{debug, info};

use crate::app::ports::{SchedulerDelegate, TaskKind};
use crate::config::SystemConfig;

// ═══════════════════════════════════════════════════════════════
//  Task types
// ═══════════════════════════════════════════════════════════════

/// A recurring job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTask {
    pub kind: TaskKind,
    pub interval_ms: u32,
}

/// Maximum number of tasks (stack-allocated).
const MAX_TASKS: usize = 4;

#[derive(Debug, Clone, Copy)]
struct TaskEntry {
    task: PeriodicTask,
    /// When the task last ran; boot counts as a run.
    last_run_ms: u64,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

pub struct Scheduler {
    slots: [Option<TaskEntry>; MAX_TASKS],
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            slots: [None; MAX_TASKS],
        }
    }

    /// All four network jobs at their configured cadences.
    pub fn from_config(config: &SystemConfig) -> Self {
        let mut s = Self::new();
        for (kind, interval_ms) in [
            (TaskKind::Telemetry, config.telemetry_interval_ms),
            (TaskKind::CommandPoll, config.command_poll_interval_ms),
            (TaskKind::Heartbeat, config.heartbeat_interval_ms),
            (TaskKind::ConfigPoll, config.config_poll_interval_ms),
        ] {
            s.add(PeriodicTask { kind, interval_ms });
        }
        s
    }

    /// Add a task.  Returns the slot index, or `None` if full.
    pub fn add(&mut self, task: PeriodicTask) -> Option<usize> {
        let (i, slot) = self.slots.iter_mut().enumerate().find(|(_, s)| s.is_none())?;
        info!(
            "Scheduler: added '{}' every {} ms at slot {}",
            task.kind.label(),
            task.interval_ms,
            i
        );
        *slot = Some(TaskEntry {
            task,
            last_run_ms: 0,
        });
        Some(i)
    }

    /// Fire every due task, in slot order.  Returns how many fired.
    pub fn tick(&mut self, now_ms: u64, delegate: &mut dyn SchedulerDelegate) -> usize {
        let mut fired = 0;
        for entry in self.slots.iter_mut().flatten() {
            let since = now_ms.saturating_sub(entry.last_run_ms);
            if since >= u64::from(entry.task.interval_ms) {
                debug!("Scheduler: '{}' due", entry.task.kind.label());
                entry.last_run_ms = now_ms;
                delegate.on_task_due(entry.task.kind, now_ms);
                fired += 1;
            }
        }
        fired
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
