//! Environment snapshot.

use serde::{Deserialize, Serialize};

/// A snapshot of the chamber at one instant.
///
/// Every sensor value is optional: `None` means the sensor failed or is not
/// fitted, and rules that need it are skipped rather than guessed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    /// Air temperature (°C).
    pub temperature_c: Option<f32>,
    /// Relative humidity (%).
    pub humidity_pct: Option<f32>,
    /// CO₂ concentration (ppm), always > 0 when present.
    pub co2_ppm: Option<u16>,
    /// Illuminance (lux).
    pub illuminance_lux: Option<f32>,
    /// Monotonic acquisition time (ms since boot).
    pub timestamp_ms: u64,
}

impl Reading {
    /// A reading with every sensor unknown.
    pub fn unknown(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            ..Self::default()
        }
    }

    /// Build a reading from sentinel-encoded raw values: NaN floats and
    /// non-positive CO₂ mean "unknown".
    pub fn from_raw(temperature_c: f32, humidity_pct: f32, co2_ppm: i32, lux: f32, timestamp_ms: u64) -> Self {
        Self {
            temperature_c: present(temperature_c),
            humidity_pct: present(humidity_pct),
            co2_ppm: co2_from_raw(co2_ppm),
            illuminance_lux: present(lux),
            timestamp_ms,
        }
    }

    /// True when no sensor produced a value.
    pub fn is_empty(&self) -> bool {
        self.temperature_c.is_none()
            && self.humidity_pct.is_none()
            && self.co2_ppm.is_none()
            && self.illuminance_lux.is_none()
    }
}

/// NaN → `None`.
pub fn present(value: f32) -> Option<f32> {
    if value.is_nan() { None } else { Some(value) }
}

/// Non-positive or out-of-range ppm → `None`.
pub fn co2_from_raw(ppm: i32) -> Option<u16> {
    if ppm > 0 { u16::try_from(ppm).ok() } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_map_to_unknown() {
        let r = Reading::from_raw(f32::NAN, 80.0, -1, f32::NAN, 42);
        assert_eq!(r.temperature_c, None);
        assert_eq!(r.humidity_pct, Some(80.0));
        assert_eq!(r.co2_ppm, None);
        assert_eq!(r.illuminance_lux, None);
        assert_eq!(r.timestamp_ms, 42);
    }

    #[test]
    fn zero_co2_is_unknown() {
        assert_eq!(co2_from_raw(0), None);
        assert_eq!(co2_from_raw(850), Some(850));
        assert_eq!(co2_from_raw(70_000), None);
    }

    #[test]
    fn unknown_reading_is_empty() {
        let r = Reading::unknown(7);
        assert!(r.is_empty());
        assert_eq!(r.temperature_c, None);
        assert_eq!(r.timestamp_ms, 7);
    }
}
