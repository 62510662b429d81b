use std::borrow::Cow;

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{
    decision::LysogenyProfile,
    scheduler::{SweepSummary, TerminationPolicy},
    seeding::{default_colonies, ColonySeed},
    site::{Occupant, Strain},
};

/// Global configuration parameters for the colony simulation.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub lattice_size: u32,
    pub seed: u64,
    pub healthy_growth_rate: u32,
    pub healthy_death_time: u32,
    pub decision_time: u32,
    pub birth_time_range: u32,
    pub strain_a: StrainParams,
    pub strain_b: StrainParams,
    /// Explicit initial colonies; the two quarter-point islands when unset.
    pub colonies: Option<Vec<ColonySeed>>,
    pub termination: TerminationPolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lattice_size: 40,
            seed: 10,
            healthy_growth_rate: 20,
            healthy_death_time: 150,
            decision_time: 30,
            birth_time_range: 2,
            strain_a: StrainParams {
                lysogeny: Some(LysogenyProfile::strain_a_default()),
                ..StrainParams::default()
            },
            strain_b: StrainParams {
                lysogeny: Some(LysogenyProfile::strain_b_default()),
                ..StrainParams::default()
            },
            colonies: None,
            termination: TerminationPolicy::default(),
        }
    }
}

impl SimulationConfig {
    pub fn strain(&self, strain: Strain) -> &StrainParams {
        match strain {
            Strain::A => &self.strain_a,
            Strain::B => &self.strain_b,
        }
    }

    /// The strain's lysogeny profile, falling back to that strain's own
    /// default table when none is configured.
    pub fn lysogeny(&self, strain: Strain) -> Cow<'_, LysogenyProfile> {
        match &self.strain(strain).lysogeny {
            Some(profile) => Cow::Borrowed(profile),
            None => Cow::Owned(LysogenyProfile::default_for(strain)),
        }
    }

    /// Division period for occupants that reproduce.
    pub fn growth_rate(&self, occupant: Occupant) -> Option<u32> {
        match occupant {
            Occupant::Healthy => Some(self.healthy_growth_rate),
            Occupant::LysogenicA => Some(self.strain_a.lysogenic_growth_rate),
            Occupant::LysogenicB => Some(self.strain_b.lysogenic_growth_rate),
            Occupant::Empty | Occupant::LyticA | Occupant::LyticB => None,
        }
    }

    pub fn initial_colonies(&self) -> Vec<ColonySeed> {
        self.colonies
            .clone()
            .unwrap_or_else(|| default_colonies(self.lattice_size))
    }
}

/// Parameters that differ between the two phage strains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrainParams {
    pub lysogenic_growth_rate: u32,
    pub lysogenic_death_time: u32,
    /// Ticks a lytic cell survives before bursting.
    pub lysis_burst_time: u32,
    /// Chance that one exposure attempt infects the cell.
    pub infection_probability: f64,
    /// Exposure attempts seeded on each neighbor by a burst.
    pub exposure_tries: u32,
    /// `None` selects the owning strain's default table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lysogeny: Option<LysogenyProfile>,
}

impl Default for StrainParams {
    fn default() -> Self {
        Self {
            lysogenic_growth_rate: 30,
            lysogenic_death_time: 120,
            lysis_burst_time: 1000,
            infection_probability: 0.4,
            exposure_tries: 3,
            lysogeny: None,
        }
    }
}

/// Tracks the index of the tick currently being simulated.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationTick(pub u64);

/// The single random stream every stochastic choice draws from.
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub ChaCha8Rng);

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

/// Event tallies from the most recent reaction sweep.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepTelemetry {
    pub last: SweepSummary,
}
