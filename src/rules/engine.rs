//! Rule evaluator.
//!
//! Looks up the stage's row in [`RULE_TABLE`](super::table::RULE_TABLE),
//! runs every band it has data for, applies the rapid-change trend rule and
//! the compound ventilation rule, then records the temperature sample for
//! the next call.

use serde::{Deserialize, Serialize};

use super::table::rules_for;
use super::{Action, AlarmLevel, Decision, RiskFlag};
use crate::model::{Reading, Stage};

/// Trend-rule parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Samples older than this are not compared (ms).
    pub rapid_change_window_ms: u64,
    /// Minimum absolute swing that counts as rapid (°C).
    pub rapid_change_delta_c: f32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            rapid_change_window_ms: 3_600_000,
            rapid_change_delta_c: 2.0,
        }
    }
}

/// Last temperature sample seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TrendSample {
    temperature_c: f32,
    at_ms: u64,
}

/// Stage-aware rule evaluator.
///
/// Pure apart from the trend sample, which is only touched when a reading
/// carries a temperature.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    config: RuleConfig,
    trend: Option<TrendSample>,
}

impl RuleEngine {
    pub fn new(config: RuleConfig) -> Self {
        Self {
            config,
            trend: None,
        }
    }

    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Forget the previous temperature sample.
    pub fn reset(&mut self) {
        self.trend = None;
    }

    /// Classify `reading` for `stage`.
    ///
    /// `None` is an unrecognised stage: the result is Normal with no flags,
    /// but the trend sample is still updated.
    pub fn evaluate(&mut self, stage: Option<Stage>, reading: &Reading, now_ms: u64) -> Decision {
        let mut decision = Decision::default();

        if let Some(stage) = stage {
            let row = rules_for(stage);

            if row.rapid_change_sensitive {
                if let Some(t) = reading.temperature_c {
                    if self.is_rapid_change(t, now_ms) {
                        decision.level.raise(AlarmLevel::Critical);
                        decision.risks.insert(RiskFlag::RapidTemperatureChange);
                    }
                }
            }

            if let (Some(rule), Some(t)) = (&row.temperature, reading.temperature_c) {
                decision.merge(rule.evaluate(t));
            }
            if let (Some(rule), Some(h)) = (&row.humidity, reading.humidity_pct) {
                decision.merge(rule.evaluate(h));
            }
            if let (Some(rule), Some(co2)) = (&row.co2, reading.co2_ppm) {
                decision.merge(rule.evaluate(co2));
            }
            if let (Some(rule), Some(co2), Some(h)) =
                (&row.composite, reading.co2_ppm, reading.humidity_pct)
            {
                decision.merge(rule.evaluate(co2, h));
            }

            // Excess heat or moisture is always vented.
            if decision.recommends(Action::DecreaseTemperature)
                || decision.recommends(Action::DecreaseHumidity)
            {
                decision.actions.insert(Action::IncreaseVentilation);
            }
        }

        if let Some(t) = reading.temperature_c {
            self.trend = Some(TrendSample {
                temperature_c: t,
                at_ms: now_ms,
            });
        }

        decision
    }

    fn is_rapid_change(&self, temperature_c: f32, now_ms: u64) -> bool {
        let Some(prev) = self.trend else {
            return false;
        };
        // A clock that went backwards gives no usable window.
        let Some(elapsed) = now_ms.checked_sub(prev.at_ms) else {
            return false;
        };
        elapsed <= self.config.rapid_change_window_ms
            && (temperature_c - prev.temperature_c).abs() >= self.config.rapid_change_delta_c
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}
