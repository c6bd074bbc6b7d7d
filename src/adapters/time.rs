//! ESP32 time adapter.
//!
//! Monotonic uptime for the control loop and wall-clock timestamps for
//! environment reports.
//!
//! - **`target_os = "espidf"`**: uptime from `esp_timer_get_time()`
//!   (microsecond precision, monotonic); wall clock from the system time
//!   that SNTP sets.
//! - **`not(target_os = "espidf")`**: `std::time::Instant` for host-side
//!   testing and simulation.

use chrono::{DateTime, SecondsFormat, Utc};

/// Reported while the wall clock has not been synchronised.
pub const UNSYNCED_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

/// Anything before 2020-01-01 means SNTP has not run yet.
const EPOCH_2020: i64 = 1_577_836_800;

pub struct Clock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time is thread-safe and has no preconditions.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Current UTC time as ISO-8601, or [`UNSYNCED_TIMESTAMP`].
    pub fn iso_timestamp(&self) -> String {
        iso_timestamp_at(Utc::now())
    }
}

/// Format `now` to whole seconds, falling back when the clock is unsynced.
pub fn iso_timestamp_at(now: DateTime<Utc>) -> String {
    if now.timestamp() < EPOCH_2020 {
        return UNSYNCED_TIMESTAMP.to_string();
    }
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}
