//! Static, stage-indexed rule table.
//!
//! Each stage row holds an optional three-tier [`BandRule`] per variable and
//! an optional composite predicate.  A single generic function,
//! [`BandRule::evaluate`], turns a row entry plus a value into a partial
//! [`Decision`], so there is no per-stage branching anywhere else.
//!
//! The numbers are husbandry constants taken from the rearing manual's
//! alarm–action matrix.  They are not tunable at runtime.
//!
//! All comparisons are strict: a value sitting exactly on a bound is inside
//! the band.

use super::{Action, AlarmLevel, Decision, RiskFlag};
use crate::model::Stage;

// ───────────────────────────────────────────────────────────────
// Building blocks
// ───────────────────────────────────────────────────────────────

/// Lower / upper trip points; `None` means that side never trips.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits<T> {
    pub below: Option<T>,
    pub above: Option<T>,
}

impl<T: PartialOrd + Copy> Limits<T> {
    pub fn is_below(&self, value: T) -> bool {
        matches!(self.below, Some(b) if value < b)
    }

    pub fn is_above(&self, value: T) -> bool {
        matches!(self.above, Some(a) if value > a)
    }

    pub fn breached(&self, value: T) -> bool {
        self.is_below(value) || self.is_above(value)
    }
}

/// Three-tier banding for one variable:
///
/// ```text
///   critical.below   inner.below        inner.above   critical.above
///  ───────┼──────────────┼─────── normal ─────┼─────────────┼───────
///  Critical  inner_level                          inner_level   Critical
///         ◀── on_low ────┤                    ├─── on_high ──▶
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandRule<T> {
    pub critical: Limits<T>,
    pub inner: Limits<T>,
    /// Level raised between the inner and critical limits.
    pub inner_level: AlarmLevel,
    /// Recommended when the value is below `inner.below`.
    pub on_low: Option<Action>,
    /// Recommended when the value is above `inner.above`.
    pub on_high: Option<Action>,
    /// Risk raised when the value is above `critical.above`.
    pub critical_high_risk: Option<RiskFlag>,
}

impl<T: PartialOrd + Copy> BandRule<T> {
    /// Classify one value against this rule.
    pub fn evaluate(&self, value: T) -> Decision {
        let mut d = Decision::default();

        if self.critical.breached(value) {
            d.level = AlarmLevel::Critical;
            if self.critical.is_above(value) {
                if let Some(risk) = self.critical_high_risk {
                    d.risks.insert(risk);
                }
            }
        } else if self.inner.breached(value) {
            d.level = self.inner_level;
        }

        // Critical limits sit outside the inner ones, so a critical breach
        // always carries the directional action too.
        if self.inner.is_below(value) {
            if let Some(action) = self.on_low {
                d.actions.insert(action);
            }
        }
        if self.inner.is_above(value) {
            if let Some(action) = self.on_high {
                d.actions.insert(action);
            }
        }

        d
    }
}

/// Risk raised only when CO₂ and humidity are *both* above their limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeRule {
    pub co2_above_ppm: u16,
    pub humidity_above_pct: f32,
    pub risk: RiskFlag,
}

impl CompositeRule {
    pub fn evaluate(&self, co2_ppm: u16, humidity_pct: f32) -> Decision {
        let mut d = Decision::default();
        if co2_ppm > self.co2_above_ppm && humidity_pct > self.humidity_above_pct {
            d.level = AlarmLevel::Critical;
            d.risks.insert(self.risk);
        }
        d
    }
}

/// One row of the table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageRules {
    pub stage: Stage,
    pub temperature: Option<BandRule<f32>>,
    pub humidity: Option<BandRule<f32>>,
    pub co2: Option<BandRule<u16>>,
    pub composite: Option<CompositeRule>,
    /// Abrupt temperature swings are critical in this stage.
    pub rapid_change_sensitive: bool,
}

// ───────────────────────────────────────────────────────────────
// Const constructors
// ───────────────────────────────────────────────────────────────

const fn outside(below: f32, above: f32) -> Limits<f32> {
    Limits {
        below: Some(below),
        above: Some(above),
    }
}

const fn above<T: Copy>(value: T) -> Limits<T> {
    Limits {
        below: None,
        above: Some(value),
    }
}

const fn unbounded<T: Copy>() -> Limits<T> {
    Limits {
        below: None,
        above: None,
    }
}

const fn temperature(critical: Limits<f32>, inner: Limits<f32>) -> Option<BandRule<f32>> {
    Some(BandRule {
        critical,
        inner,
        inner_level: AlarmLevel::Warning,
        on_low: Some(Action::IncreaseTemperature),
        on_high: Some(Action::DecreaseTemperature),
        critical_high_risk: None,
    })
}

const fn humidity(
    critical: Limits<f32>,
    inner: Limits<f32>,
    critical_high_risk: Option<RiskFlag>,
) -> Option<BandRule<f32>> {
    Some(BandRule {
        critical,
        inner,
        inner_level: AlarmLevel::Warning,
        on_low: Some(Action::IncreaseHumidity),
        on_high: Some(Action::DecreaseHumidity),
        critical_high_risk,
    })
}

/// CO₂ has only an upper side; its inner tier is a Risk and always asks for
/// more ventilation.
const fn co2(critical_above: u16, risk_above: u16) -> Option<BandRule<u16>> {
    Some(BandRule {
        critical: above(critical_above),
        inner: above(risk_above),
        inner_level: AlarmLevel::Risk,
        on_low: None,
        on_high: Some(Action::IncreaseVentilation),
        critical_high_risk: None,
    })
}

const MUSCARDINE: Option<RiskFlag> = Some(RiskFlag::Muscardine);

// ───────────────────────────────────────────────────────────────
// The table
// ───────────────────────────────────────────────────────────────

/// Rule rows indexed by [`Stage::index`].
pub static RULE_TABLE: [StageRules; Stage::COUNT] = [
    StageRules {
        stage: Stage::EggIncubation,
        temperature: temperature(outside(24.0, 27.0), outside(25.0, 26.0)),
        humidity: humidity(outside(80.0, 90.0), outside(82.0, 88.0), None),
        co2: co2(1000, 900),
        composite: None,
        rapid_change_sensitive: false,
    },
    StageRules {
        stage: Stage::Adaptation,
        temperature: temperature(outside(27.0, 29.0), outside(27.5, 28.5)),
        humidity: humidity(outside(86.0, 92.0), outside(88.0, 91.0), None),
        co2: co2(800, 700),
        composite: None,
        rapid_change_sensitive: false,
    },
    StageRules {
        stage: Stage::Larva1,
        temperature: temperature(unbounded(), outside(26.5, 27.5)),
        humidity: humidity(above(90.0), outside(86.0, 89.0), MUSCARDINE),
        co2: co2(900, 800),
        composite: None,
        rapid_change_sensitive: false,
    },
    StageRules {
        stage: Stage::Larva2,
        temperature: temperature(unbounded(), outside(25.5, 26.5)),
        humidity: humidity(above(85.0), outside(81.0, 84.0), None),
        co2: co2(1000, 900),
        composite: None,
        rapid_change_sensitive: false,
    },
    StageRules {
        stage: Stage::Larva3,
        temperature: temperature(unbounded(), outside(24.5, 25.5)),
        humidity: humidity(above(80.0), outside(76.0, 79.0), MUSCARDINE),
        co2: co2(1100, 1000),
        composite: None,
        rapid_change_sensitive: false,
    },
    StageRules {
        stage: Stage::Larva4,
        temperature: None,
        humidity: humidity(above(75.0), above(74.0), MUSCARDINE),
        co2: co2(1200, 1100),
        composite: Some(CompositeRule {
            co2_above_ppm: 1200,
            humidity_above_pct: 75.0,
            risk: RiskFlag::Flacherie,
        }),
        rapid_change_sensitive: false,
    },
    StageRules {
        stage: Stage::Larva5,
        temperature: None,
        humidity: humidity(above(70.0), above(69.0), MUSCARDINE),
        co2: co2(1200, 1100),
        composite: None,
        rapid_change_sensitive: true,
    },
    StageRules {
        stage: Stage::Cocoon,
        temperature: None,
        humidity: humidity(
            above(70.0),
            outside(63.0, 68.0),
            Some(RiskFlag::CocoonQuality),
        ),
        co2: co2(1000, 900),
        composite: None,
        rapid_change_sensitive: false,
    },
];

/// Row for `stage`.
pub fn rules_for(stage: Stage) -> &'static StageRules {
    &RULE_TABLE[stage.index()]
}
