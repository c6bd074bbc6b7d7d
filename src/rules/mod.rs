//! Decision engine: stage-aware classification of a single [`Reading`].
//!
//! ```text
//!   Reading ──▶ RuleEngine ──▶ Decision { level, actions, risks }
//!                  │  ▲
//!                  ▼  │ TrendState (last temperature sample)
//!              RULE_TABLE[stage]
//! ```
//!
//! The engine only classifies and recommends.  It never drives an actuator;
//! the [`Controller`](crate::control::controller::Controller) makes the
//! physical decisions from its own hysteresis state.
//!
//! [`Reading`]: crate::model::Reading

pub mod engine;
pub mod table;

use core::fmt;
use core::marker::PhantomData;

// ---------------------------------------------------------------------------
// Alarm level
// ---------------------------------------------------------------------------

/// Ordinal severity of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum AlarmLevel {
    #[default]
    Normal = 0,
    Warning = 1,
    Risk = 2,
    Critical = 3,
}

impl AlarmLevel {
    /// Monotonic accumulation: keep the more severe of the two.
    pub fn raise(&mut self, other: AlarmLevel) {
        if other > *self {
            *self = other;
        }
    }

    /// Coarse stress classification reported upstream.
    pub const fn stress_level(self) -> StressLevel {
        match self {
            Self::Critical => StressLevel::High,
            Self::Risk | Self::Warning => StressLevel::Medium,
            Self::Normal => StressLevel::Low,
        }
    }
}

impl fmt::Display for AlarmLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Warning => write!(f, "warning"),
            Self::Risk => write!(f, "risk"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

impl StressLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

// ---------------------------------------------------------------------------
// Flag sets
// ---------------------------------------------------------------------------

/// A single-bit flag that can live in a [`Flags`] set.
pub trait Flag: Copy + 'static {
    /// Every flag of this kind, in reporting order.
    const ALL: &'static [Self];
    fn mask(self) -> u8;
}

/// Compact bit set of flags of one kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flags<F: Flag> {
    bits: u8,
    _kind: PhantomData<F>,
}

impl<F: Flag> Flags<F> {
    pub const fn empty() -> Self {
        Self {
            bits: 0,
            _kind: PhantomData,
        }
    }

    pub fn insert(&mut self, flag: F) {
        self.bits |= flag.mask();
    }

    pub fn extend(&mut self, other: Self) {
        self.bits |= other.bits;
    }

    pub fn contains(&self, flag: F) -> bool {
        self.bits & flag.mask() != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub const fn bits(&self) -> u8 {
        self.bits
    }

    /// Set flags in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = F> + '_ {
        F::ALL.iter().copied().filter(|f| self.contains(*f))
    }
}

impl<F: Flag> Default for Flags<F> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<F: Flag + fmt::Debug> fmt::Debug for Flags<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Recommended corrective actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Action {
    IncreaseVentilation = 0b0000_0001,
    IncreaseHumidity = 0b0000_0010,
    DecreaseHumidity = 0b0000_0100,
    IncreaseTemperature = 0b0000_1000,
    DecreaseTemperature = 0b0001_0000,
}

impl Action {
    /// Wire name used in environment reports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IncreaseVentilation => "increase_ventilation",
            Self::IncreaseHumidity => "increase_humidity",
            Self::DecreaseHumidity => "decrease_humidity",
            Self::IncreaseTemperature => "increase_temperature",
            Self::DecreaseTemperature => "decrease_temperature",
        }
    }
}

impl Flag for Action {
    const ALL: &'static [Self] = &[
        Self::IncreaseVentilation,
        Self::IncreaseHumidity,
        Self::DecreaseHumidity,
        Self::IncreaseTemperature,
        Self::DecreaseTemperature,
    ];

    fn mask(self) -> u8 {
        self as u8
    }
}

/// Named disease / quality hazards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RiskFlag {
    /// Bacterial flacherie (stale, humid air).
    Flacherie = 0b0000_0001,
    /// Fungal muscardine (excess humidity).
    Muscardine = 0b0000_0010,
    /// Poor cocoon reeling quality.
    CocoonQuality = 0b0000_0100,
    /// Abrupt temperature swing.
    RapidTemperatureChange = 0b0000_1000,
}

impl RiskFlag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flacherie => "flacherie",
            Self::Muscardine => "muscardine",
            Self::CocoonQuality => "cocoon_quality",
            Self::RapidTemperatureChange => "rapid_temp_change",
        }
    }
}

impl Flag for RiskFlag {
    const ALL: &'static [Self] = &[
        Self::Flacherie,
        Self::Muscardine,
        Self::CocoonQuality,
        Self::RapidTemperatureChange,
    ];

    fn mask(self) -> u8 {
        self as u8
    }
}

pub type ActionSet = Flags<Action>;
pub type RiskSet = Flags<RiskFlag>;

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decision {
    pub level: AlarmLevel,
    pub actions: ActionSet,
    pub risks: RiskSet,
}

impl Decision {
    /// Fold another partial result into this one: the level only rises and
    /// flag sets only grow.
    pub fn merge(&mut self, other: Decision) {
        self.level.raise(other.level);
        self.actions.extend(other.actions);
        self.risks.extend(other.risks);
    }

    pub fn recommends(&self, action: Action) -> bool {
        self.actions.contains(action)
    }

    pub fn has_risk(&self, risk: RiskFlag) -> bool {
        self.risks.contains(risk)
    }

    pub fn stress_level(&self) -> StressLevel {
        self.level.stress_level()
    }

    /// Normal with nothing flagged.
    pub fn is_quiet(&self) -> bool {
        self.level == AlarmLevel::Normal && self.actions.is_empty() && self.risks.is_empty()
    }
}
