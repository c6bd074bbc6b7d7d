//! Per-stage acceptable bands and their resolution against global fallbacks.
//!
//! A [`ThresholdSet`] arrives from the remote configuration source with any
//! bound possibly missing.  The controller never works on the raw set; it
//! works on [`ResolvedThresholds`], where every missing bound has been
//! replaced *per variable* by the configured fallback and a missing optimum
//! has been derived as the midpoint of the resolved min and max.

use serde::{Deserialize, Serialize};

/// Types that can produce a midpoint between two bounds.
pub trait Midpoint: Copy + PartialOrd {
    fn midpoint(a: Self, b: Self) -> Self;
}

impl Midpoint for f32 {
    fn midpoint(a: Self, b: Self) -> Self {
        (a + b) / 2.0
    }
}

impl Midpoint for u16 {
    fn midpoint(a: Self, b: Self) -> Self {
        ((u32::from(a) + u32::from(b)) / 2) as u16
    }
}

/// A `{min, optimal, max}` triple where any bound may be unknown.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Band<T> {
    pub min: Option<T>,
    pub optimal: Option<T>,
    pub max: Option<T>,
}

/// A fully resolved `{min, optimal, max}` triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setpoints<T> {
    pub min: T,
    pub optimal: T,
    pub max: T,
}

impl<T: Midpoint> Band<T> {
    pub const fn new(min: Option<T>, optimal: Option<T>, max: Option<T>) -> Self {
        Self { min, optimal, max }
    }

    /// All three bounds unknown.
    pub fn is_unset(&self) -> bool {
        self.min.is_none() && self.optimal.is_none() && self.max.is_none()
    }

    /// `min <= optimal <= max` over whichever bounds are present.
    pub fn is_ordered(&self) -> bool {
        let le = |a: Option<T>, b: Option<T>| match (a, b) {
            (Some(a), Some(b)) => a <= b,
            _ => true,
        };
        le(self.min, self.optimal) && le(self.optimal, self.max) && le(self.min, self.max)
    }

    /// Fill a missing optimum from min and max when both are known.
    #[must_use]
    pub fn with_derived_optimal(mut self) -> Self {
        if self.optimal.is_none() {
            if let (Some(min), Some(max)) = (self.min, self.max) {
                self.optimal = Some(T::midpoint(min, max));
            }
        }
        self
    }

    /// Substitute the fallback for each unknown bound, then derive the
    /// optimum from the resolved min/max if it is still unknown.
    pub fn resolve(&self, fallback_min: T, fallback_max: T) -> Setpoints<T> {
        let min = self.min.unwrap_or(fallback_min);
        let max = self.max.unwrap_or(fallback_max);
        let optimal = self.optimal.unwrap_or_else(|| T::midpoint(min, max));
        Setpoints { min, optimal, max }
    }
}

/// Per-stage bands for the three controlled variables.
///
/// Replaced wholesale on every successful fetch, never merged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub temperature: Band<f32>,
    pub humidity: Band<f32>,
    pub co2: Band<u16>,
}

impl ThresholdSet {
    /// Check `min <= optimal <= max` for every variable.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.temperature.is_ordered() {
            return Err("temperature bounds out of order");
        }
        if !self.humidity.is_ordered() {
            return Err("humidity bounds out of order");
        }
        if !self.co2.is_ordered() {
            return Err("co2 bounds out of order");
        }
        Ok(())
    }

    /// Derive every missing optimum that has both neighbours.
    #[must_use]
    pub fn with_derived_optima(self) -> Self {
        Self {
            temperature: self.temperature.with_derived_optimal(),
            humidity: self.humidity.with_derived_optimal(),
            co2: self.co2.with_derived_optimal(),
        }
    }

    pub fn resolve(&self, fallback: &FallbackThresholds) -> ResolvedThresholds {
        ResolvedThresholds {
            temperature: self
                .temperature
                .resolve(fallback.temperature_min_c, fallback.temperature_max_c),
            humidity: self
                .humidity
                .resolve(fallback.humidity_min_pct, fallback.humidity_max_pct),
            co2: self.co2.resolve(fallback.co2_min_ppm, fallback.co2_max_ppm),
        }
    }
}

/// Global defaults substituted for unknown bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackThresholds {
    pub temperature_min_c: f32,
    pub temperature_max_c: f32,
    pub humidity_min_pct: f32,
    pub humidity_max_pct: f32,
    pub co2_min_ppm: u16,
    pub co2_max_ppm: u16,
}

impl Default for FallbackThresholds {
    fn default() -> Self {
        Self {
            temperature_min_c: 24.0,
            temperature_max_c: 28.0,
            humidity_min_pct: 75.0,
            humidity_max_pct: 85.0,
            co2_min_ppm: 0,
            co2_max_ppm: 1200,
        }
    }
}

/// Thresholds with every bound known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedThresholds {
    pub temperature: Setpoints<f32>,
    pub humidity: Setpoints<f32>,
    pub co2: Setpoints<u16>,
}
