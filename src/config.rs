//! System configuration parameters
//!
//! Every tunable of the chamber controller in one place.  The stored copy
//! lives in NVS (see [`NvsAdapter`](crate::adapters::nvs::NvsAdapter)); the
//! control core receives the derived views below at construction instead of
//! reading globals.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::control::{ControllerConfig, HysteresisMargins};
use crate::model::{FallbackThresholds, Stage, StageId};
use crate::rules::engine::RuleConfig;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Identity / remote API ---
    /// Device id reported to the remote API
    pub device_id: String<32>,
    /// Base URL of the remote API, without trailing slash
    pub api_base_url: String<96>,
    /// Sent as `x-api-key`; empty disables the header
    pub api_key: String<64>,

    // --- Wi-Fi ---
    pub wifi_ssid: String<32>,
    pub wifi_password: String<64>,

    // --- Rearing ---
    /// Stage used until the remote config names one
    pub default_stage: StageId,

    // --- Control ---
    /// Substituted for unknown threshold bounds
    pub fallback: FallbackThresholds,
    /// Dead bands around each optimum
    pub hysteresis: HysteresisMargins,
    /// Lighting comes on below this illuminance (lux)
    pub lighting_lux_floor: f32,

    // --- Trend rule ---
    /// Maximum age of the previous temperature sample (ms)
    pub rapid_change_window_ms: u64,
    /// Swing that counts as rapid (°C)
    pub rapid_change_delta_c: f32,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Environment report interval (milliseconds)
    pub telemetry_interval_ms: u32,
    /// Remote command poll interval (milliseconds)
    pub command_poll_interval_ms: u32,
    /// Heartbeat interval (milliseconds)
    pub heartbeat_interval_ms: u32,
    /// Stage / threshold refresh interval (milliseconds)
    pub config_poll_interval_ms: u32,
    /// Task watchdog timeout (seconds)
    pub watchdog_timeout_secs: u32,
    /// Per-request HTTP timeout (milliseconds)
    pub http_timeout_ms: u32,

    // --- Hardware ---
    /// Local status/control HTTP port
    pub local_web_port: u16,
    /// Relay boards on this device switch on a LOW input
    pub relay_active_low: bool,
}

fn fixed<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            device_id: fixed("wemos-d1-r32-01"),
            api_base_url: fixed("http://localhost:8080"),
            api_key: String::new(),

            wifi_ssid: String::new(),
            wifi_password: String::new(),

            default_stage: fixed(Stage::Larva4.id()),

            fallback: FallbackThresholds::default(),
            hysteresis: HysteresisMargins::default(),
            lighting_lux_floor: 50.0,

            rapid_change_window_ms: 3_600_000, // 1 h
            rapid_change_delta_c: 2.0,

            control_loop_interval_ms: 1000,  // 1 Hz
            telemetry_interval_ms: 10_000,   // 10 s
            command_poll_interval_ms: 2000,  // 2 s
            heartbeat_interval_ms: 30_000,   // 30 s
            config_poll_interval_ms: 60_000, // 1/min
            watchdog_timeout_secs: 300,      // 5 min
            http_timeout_ms: 5000,

            local_web_port: 80,
            relay_active_low: true,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    ///
    /// Float checks are written negated so that NaN fails them.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fb = &self.fallback;
        if !(fb.temperature_min_c < fb.temperature_max_c) {
            return Err(ConfigError::ValidationFailed(
                "fallback temperature min must be below max",
            ));
        }
        if !(fb.humidity_min_pct < fb.humidity_max_pct) {
            return Err(ConfigError::ValidationFailed(
                "fallback humidity min must be below max",
            ));
        }
        if fb.humidity_min_pct < 0.0 || fb.humidity_max_pct > 100.0 {
            return Err(ConfigError::ValidationFailed(
                "fallback humidity outside 0-100 %",
            ));
        }
        if fb.co2_min_ppm >= fb.co2_max_ppm {
            return Err(ConfigError::ValidationFailed(
                "fallback co2 min must be below max",
            ));
        }

        let h = &self.hysteresis;
        if !(h.temperature_c >= 0.0) || !(h.humidity_pct >= 0.0) {
            return Err(ConfigError::ValidationFailed(
                "hysteresis margins must be non-negative",
            ));
        }
        if !(self.lighting_lux_floor >= 0.0) {
            return Err(ConfigError::ValidationFailed(
                "lighting lux floor must be non-negative",
            ));
        }
        if !(self.rapid_change_delta_c > 0.0) || self.rapid_change_window_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "rapid-change window and delta must be positive",
            ));
        }

        let cadences = [
            self.control_loop_interval_ms,
            self.telemetry_interval_ms,
            self.command_poll_interval_ms,
            self.heartbeat_interval_ms,
            self.config_poll_interval_ms,
            self.http_timeout_ms,
        ];
        if cadences.contains(&0) {
            return Err(ConfigError::ValidationFailed("intervals must be non-zero"));
        }
        if u64::from(self.watchdog_timeout_secs) * 1000 <= u64::from(self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "watchdog timeout must exceed the control interval",
            ));
        }

        if self.device_id.is_empty() {
            return Err(ConfigError::ValidationFailed("device_id is empty"));
        }
        if Stage::parse(&self.default_stage).is_none() {
            return Err(ConfigError::ValidationFailed("default_stage is not a known stage"));
        }
        if self.local_web_port == 0 {
            return Err(ConfigError::ValidationFailed("local_web_port is zero"));
        }
        Ok(())
    }

    // ── Derived views ─────────────────────────────────────────

    pub fn fallback_thresholds(&self) -> FallbackThresholds {
        self.fallback
    }

    pub fn hysteresis(&self) -> HysteresisMargins {
        self.hysteresis
    }

    pub fn rule_config(&self) -> RuleConfig {
        RuleConfig {
            rapid_change_window_ms: self.rapid_change_window_ms,
            rapid_change_delta_c: self.rapid_change_delta_c,
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            fallback: self.fallback_thresholds(),
            margins: self.hysteresis(),
            lighting_lux_floor: self.lighting_lux_floor,
        }
    }
}
