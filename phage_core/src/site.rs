use serde::{Deserialize, Serialize};

/// Phage strain competing for the colony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strain {
    A,
    B,
}

/// What currently lives on a lattice site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Occupant {
    #[default]
    Empty,
    Healthy,
    LysogenicA,
    LyticA,
    LysogenicB,
    LyticB,
}

impl Occupant {
    pub fn lysogenic(strain: Strain) -> Self {
        match strain {
            Strain::A => Occupant::LysogenicA,
            Strain::B => Occupant::LysogenicB,
        }
    }

    pub fn lytic(strain: Strain) -> Self {
        match strain {
            Strain::A => Occupant::LyticA,
            Strain::B => Occupant::LyticB,
        }
    }

    pub fn is_occupied(self) -> bool {
        self != Occupant::Empty
    }

    /// Strain carried by an infected occupant.
    pub fn strain(self) -> Option<Strain> {
        match self {
            Occupant::LysogenicA | Occupant::LyticA => Some(Strain::A),
            Occupant::LysogenicB | Occupant::LyticB => Some(Strain::B),
            Occupant::Empty | Occupant::Healthy => None,
        }
    }

    pub fn is_lytic(self) -> bool {
        matches!(self, Occupant::LyticA | Occupant::LyticB)
    }

    pub fn is_lysogenic(self) -> bool {
        matches!(self, Occupant::LysogenicA | Occupant::LysogenicB)
    }

    /// Healthy cells and lysogens divide; lytic cells only wait to burst.
    pub fn can_reproduce(self) -> bool {
        matches!(
            self,
            Occupant::Healthy | Occupant::LysogenicA | Occupant::LysogenicB
        )
    }
}

/// A strain-tagged counter. `Clear` stands for zero; the tagged variants
/// always carry a positive count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StrainCount {
    #[default]
    Clear,
    A(u32),
    B(u32),
}

impl StrainCount {
    pub fn new(strain: Strain, count: u32) -> Self {
        match (strain, count) {
            (_, 0) => StrainCount::Clear,
            (Strain::A, n) => StrainCount::A(n),
            (Strain::B, n) => StrainCount::B(n),
        }
    }

    pub fn strain(self) -> Option<Strain> {
        match self {
            StrainCount::Clear => None,
            StrainCount::A(_) => Some(Strain::A),
            StrainCount::B(_) => Some(Strain::B),
        }
    }

    pub fn count(self) -> u32 {
        match self {
            StrainCount::Clear => 0,
            StrainCount::A(n) | StrainCount::B(n) => n,
        }
    }

    /// Count attributed to `strain`; zero when clear or tagged with the other strain.
    pub fn count_for(self, strain: Strain) -> u32 {
        if self.strain() == Some(strain) {
            self.count()
        } else {
            0
        }
    }

    pub fn is_clear(self) -> bool {
        self == StrainCount::Clear
    }

    /// Moves one unit toward zero, keeping the tag.
    pub fn step_down(self) -> Self {
        match self {
            StrainCount::Clear => StrainCount::Clear,
            StrainCount::A(n) => StrainCount::new(Strain::A, n - 1),
            StrainCount::B(n) => StrainCount::new(Strain::B, n - 1),
        }
    }

    /// Adds one unit for `strain`. A unit of the opposing strain cancels one
    /// unit instead, so the counter behaves like a signed accumulator.
    pub fn add(self, strain: Strain) -> Self {
        match (self, strain) {
            (StrainCount::Clear, strain) => StrainCount::new(strain, 1),
            (StrainCount::A(n), Strain::A) => StrainCount::A(n + 1),
            (StrainCount::B(n), Strain::B) => StrainCount::B(n + 1),
            (StrainCount::A(_), Strain::B) | (StrainCount::B(_), Strain::A) => self.step_down(),
        }
    }
}

/// Per-site mutable state. `None` timers are inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Site {
    pub occupant: Occupant,
    /// Ticks since birth.
    pub age: Option<u32>,
    /// Ticks until the next division attempt; armed once per growth cycle.
    pub birth_countdown: Option<u32>,
    /// Ticks since the cell committed to lysis.
    pub lytic_clock: Option<u32>,
    /// Remaining exposure rolls and the strain applying them.
    pub exposure: StrainCount,
    /// Ticks left before the fate decision and the strain that started it.
    pub decision: StrainCount,
    /// Successful exposure events accumulated for the pending decision.
    pub multiplicity: StrainCount,
}

impl Site {
    /// A freshly placed cell. Pending exposure already on the site is kept.
    pub(crate) fn newborn(occupant: Occupant, exposure: StrainCount) -> Self {
        Self {
            occupant,
            age: Some(0),
            birth_countdown: None,
            lytic_clock: occupant.is_lytic().then_some(0),
            exposure,
            decision: StrainCount::Clear,
            multiplicity: StrainCount::Clear,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.occupant.is_occupied()
    }

    /// No pending exposure and no pending decision.
    pub fn is_stable(&self) -> bool {
        self.exposure.is_clear() && self.decision.is_clear()
    }

    pub(crate) fn advance_timers(&mut self) {
        if let Some(age) = self.age.as_mut() {
            *age += 1;
        }
        // Counting down past zero deactivates the countdown.
        self.birth_countdown = self.birth_countdown.and_then(|ticks| ticks.checked_sub(1));
        if let Some(clock) = self.lytic_clock.as_mut() {
            *clock += 1;
        }
    }
}
