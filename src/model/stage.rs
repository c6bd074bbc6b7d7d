//! Rearing timeline stages.
//!
//! The stage is assigned by the operator (remote config) and never inferred
//! locally.  It selects the rule-table row and keys the threshold fetch.

use core::fmt;

/// Raw stage id as held and reported.  It may name a stage this firmware
/// does not know; [`Stage::parse`] decides.
pub type StageId = heapless::String<32>;

/// Copy `id` into a [`StageId`].  Empty or over-long ids yield `None`.
pub fn stage_id(id: &str) -> Option<StageId> {
    if id.is_empty() {
        return None;
    }
    StageId::try_from(id).ok()
}

/// A named phase of the rearing timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Stage {
    EggIncubation = 0,
    /// Day 0–1 adaptation after hatching.
    Adaptation = 1,
    Larva1 = 2,
    Larva2 = 3,
    Larva3 = 4,
    Larva4 = 5,
    /// Final larval instar.
    Larva5 = 6,
    Cocoon = 7,
}

impl Stage {
    pub const COUNT: usize = 8;

    pub const ALL: [Stage; Self::COUNT] = [
        Self::EggIncubation,
        Self::Adaptation,
        Self::Larva1,
        Self::Larva2,
        Self::Larva3,
        Self::Larva4,
        Self::Larva5,
        Self::Cocoon,
    ];

    /// Parse a wire id.  Unknown ids return `None`, which the rule engine
    /// treats as "no action".
    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Wire id used by the remote API.
    pub const fn id(self) -> &'static str {
        match self {
            Self::EggIncubation => "egg_incubation",
            Self::Adaptation => "adaptation_0_1",
            Self::Larva1 => "larva_1",
            Self::Larva2 => "larva_2",
            Self::Larva3 => "larva_3",
            Self::Larva4 => "larva_4",
            Self::Larva5 => "larva_5",
            Self::Cocoon => "cocoon",
        }
    }

    /// Row index into the rule table.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
