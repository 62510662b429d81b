//! Exposure rolls and the lysogeny/lysis decision for healthy cells.
//!
//! A healthy site carrying exposure rolls once per tick against its strain's
//! infection probability. The first success arms a decision window; every
//! further success raises the multiplicity of infection (MOI). When the window
//! closes the cell commits, irreversibly, to lysogeny or lysis with a
//! probability drawn from the strain's [`LysogenyProfile`].

use bevy::math::UVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    lattice::Lattice,
    resources::SimulationConfig,
    site::{Occupant, Strain, StrainCount},
};

/// Maps a multiplicity of infection to the probability of lysogeny.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LysogenyProfile {
    /// Entry `i` is the probability used for multiplicity `i + 1`.
    pub overrides: Vec<f64>,
    /// Probability for multiplicities past the override table. The base
    /// curve applies when unset.
    pub saturation: Option<f64>,
}

impl LysogenyProfile {
    /// Lysis at MOI 1, lysogeny from MOI 2 upward.
    pub fn strain_a_default() -> Self {
        Self {
            overrides: vec![0.0, 1.0, 1.0],
            saturation: Some(1.0),
        }
    }

    /// Lysis at MOI 1 and 2, lysogeny from MOI 3 upward.
    pub fn strain_b_default() -> Self {
        Self {
            overrides: vec![0.0, 0.0, 1.0],
            saturation: Some(1.0),
        }
    }

    pub fn default_for(strain: Strain) -> Self {
        match strain {
            Strain::A => Self::strain_a_default(),
            Strain::B => Self::strain_b_default(),
        }
    }

    pub fn probability(&self, multiplicity: u32) -> f64 {
        if multiplicity == 0 {
            return 0.0;
        }
        let slot = (multiplicity - 1) as usize;
        let p = match (self.overrides.get(slot), self.saturation) {
            (Some(p), _) => *p,
            (None, Some(p)) => p,
            (None, None) => base_curve(multiplicity),
        };
        p.clamp(0.0, 1.0)
    }
}

/// `(e^m - 1) / (20 m)`, clamped to a probability.
pub fn base_curve(multiplicity: u32) -> f64 {
    if multiplicity == 0 {
        return 0.0;
    }
    let m = f64::from(multiplicity);
    ((m.exp() - 1.0) / (20.0 * m)).clamp(0.0, 1.0)
}

/// Rolls a percentile die against `probability`.
fn roll_below<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    let roll: u32 = rng.gen_range(0..100);
    f64::from(roll) < probability * 100.0
}

/// Chooses lysogeny or lysis for a cell whose decision window closed.
pub fn decide_fate<R: Rng + ?Sized>(
    strain: Strain,
    multiplicity: u32,
    profile: &LysogenyProfile,
    rng: &mut R,
) -> Occupant {
    if roll_below(rng, profile.probability(multiplicity)) {
        Occupant::lysogenic(strain)
    } else {
        Occupant::lytic(strain)
    }
}

/// Runs one tick of exposure and decision bookkeeping on a healthy site.
///
/// Returns the committed fate when the decision window closes this tick.
/// Non-healthy and off-grid sites are left alone.
pub fn resolve_exposure<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    pos: UVec2,
    config: &SimulationConfig,
    rng: &mut R,
) -> Option<Occupant> {
    let site = lattice.site_mut(pos)?;
    if site.occupant != Occupant::Healthy {
        return None;
    }

    if let Some(strain) = site.exposure.strain() {
        if roll_below(rng, config.strain(strain).infection_probability) {
            site.multiplicity = site.multiplicity.add(strain);
            if site.decision.is_clear() {
                site.decision = StrainCount::new(strain, config.decision_time);
            }
        }
        site.exposure = site.exposure.step_down();
    }

    let strain = site.decision.strain()?;
    site.decision = site.decision.step_down();
    if !site.decision.is_clear() {
        return None;
    }

    let multiplicity = site.multiplicity.count_for(strain);
    let fate = decide_fate(strain, multiplicity, &config.lysogeny(strain), rng);
    lattice.commit(pos, fate);
    trace!(
        target: "phage::lifecycle",
        x = pos.x,
        y = pos.y,
        ?strain,
        multiplicity,
        ?fate,
        "decision.committed"
    );
    Some(fate)
}
