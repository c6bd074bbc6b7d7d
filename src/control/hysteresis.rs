//! Per-actuator demand functions used by the automatic pass.
//!
//! All comparisons are done in `f32`; CO₂ set-points are widened from
//! `u16` first, which is exact over the sensor's range.

use serde::{Deserialize, Serialize};

use crate::model::{Reading, ResolvedThresholds, Setpoints};

/// Dead-band half-widths around each optimum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HysteresisMargins {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub co2_ppm: u16,
}

impl Default for HysteresisMargins {
    fn default() -> Self {
        Self {
            temperature_c: 0.3,
            humidity_pct: 1.0,
            co2_ppm: 50,
        }
    }
}

/// Bang-bang control with hard limits.
///
/// ```text
///  value < min              → on
///  value > max              → off
///  off and value < opt − m  → on
///  on  and value > opt + m  → off
///  otherwise                → hold
/// ```
///
/// An unknown value always means off.
pub fn schmitt(value: Option<f32>, band: Setpoints<f32>, margin: f32, currently_on: bool) -> bool {
    let Some(v) = value else {
        return false;
    };
    if v < band.min {
        true
    } else if v > band.max {
        false
    } else if !currently_on && v < band.optimal - margin {
        true
    } else if currently_on && v > band.optimal + margin {
        false
    } else {
        currently_on
    }
}

/// True when `value` is above the hard max or above the dead band.
pub fn exceeds(value: f32, band: Setpoints<f32>, margin: f32) -> bool {
    value > band.max || value > band.optimal + margin
}

/// Fan demand: on when any known variable is in excess.
///
/// There is no "force off" band.  CO₂ below `opt − m` only withdraws the
/// CO₂ vote; temperature or humidity can still hold the fan on.
pub fn ventilation_demand(
    reading: &Reading,
    thresholds: &ResolvedThresholds,
    margins: &HysteresisMargins,
) -> bool {
    let co2 = reading
        .co2_ppm
        .is_some_and(|ppm| exceeds(f32::from(ppm), widen(thresholds.co2), f32::from(margins.co2_ppm)));
    let temperature = reading
        .temperature_c
        .is_some_and(|t| exceeds(t, thresholds.temperature, margins.temperature_c));
    let humidity = reading
        .humidity_pct
        .is_some_and(|h| exceeds(h, thresholds.humidity, margins.humidity_pct));

    co2 || temperature || humidity
}

/// Lights on exactly when illuminance is known and under the floor.
pub fn lighting_demand(lux: Option<f32>, floor_lux: f32) -> bool {
    lux.is_some_and(|l| l < floor_lux)
}

fn widen(sp: Setpoints<u16>) -> Setpoints<f32> {
    Setpoints {
        min: f32::from(sp.min),
        optimal: f32::from(sp.optimal),
        max: f32::from(sp.max),
    }
}
