//! Inter-task command inbox.
//!
//! The local web server runs handlers on its own task.  They never touch
//! the controller: commands go into a bounded `embassy-sync` channel that
//! the control loop drains, and the mode status they report is a snapshot
//! the loop republishes after every cycle.  The control loop stays the only
//! writer of the mode registry and the actuator bank.
//!
//! ```text
//! ┌──────────────┐  AppCommand   ┌──────────────┐
//! │  HTTP task   │──────────────▶│ Control Loop │
//! │  (handlers)  │◀──────────────│   (sync)     │
//! └──────────────┘ ModeSnapshot  └──────────────┘
//! ```

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use super::commands::AppCommand;
use crate::control::ModeSnapshot;

/// Channel depth for inbound commands.
const INBOX_DEPTH: usize = 8;

/// Inbound command channel: HTTP task → control loop.
static INBOX: Channel<CriticalSectionRawMutex, AppCommand, INBOX_DEPTH> = Channel::new();

/// Latest mode registry published by the control loop.
static MODES: Mutex<CriticalSectionRawMutex, Cell<ModeSnapshot>> =
    Mutex::new(Cell::new(ModeSnapshot::new()));

/// Queue a command for the control loop.  Returns `false` (and drops the
/// command) when the inbox is full.
pub fn submit(cmd: AppCommand) -> bool {
    match INBOX.try_send(cmd) {
        Ok(()) => true,
        Err(_) => {
            warn!("Command inbox full, dropping command");
            false
        }
    }
}

/// Hand every queued command to `f`, oldest first.  Returns the count.
pub fn drain(mut f: impl FnMut(AppCommand)) -> usize {
    let mut n = 0;
    while let Ok(cmd) = INBOX.try_receive() {
        f(cmd);
        n += 1;
    }
    n
}

pub fn publish_modes(modes: ModeSnapshot) {
    MODES.lock(|cell| cell.set(modes));
}

pub fn current_modes() -> ModeSnapshot {
    MODES.lock(Cell::get)
}
