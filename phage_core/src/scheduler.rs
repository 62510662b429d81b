use bevy::math::UVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    lattice::Lattice,
    lifecycle::{update_site, SiteOutcome},
    resources::SimulationConfig,
    site::Occupant,
};

/// Event tallies for one reaction sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub deaths: u32,
    pub bursts: u32,
    pub births: u32,
    pub lysogenic_commitments: u32,
    pub lytic_commitments: u32,
}

impl SweepSummary {
    fn absorb(&mut self, outcome: SiteOutcome) {
        match outcome {
            SiteOutcome::Vacant => {}
            SiteOutcome::Died { burst, .. } => {
                self.deaths += 1;
                self.bursts += u32::from(burst);
            }
            SiteOutcome::Lived {
                committed,
                daughter,
            } => {
                match committed {
                    Some(fate) if fate.is_lysogenic() => self.lysogenic_commitments += 1,
                    Some(Occupant::LyticA | Occupant::LyticB) => self.lytic_commitments += 1,
                    _ => {}
                }
                self.births += u32::from(daughter.is_some());
            }
        }
    }
}

/// When the tick loop should stop.
///
/// The tick budget always applies. The two flags are independent early
/// exits; both are off by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationPolicy {
    pub tick_budget: u64,
    /// Stop after the first tick that ends with every site occupied.
    pub stop_when_full: bool,
    /// Stop after the first tick that ends with no site occupied.
    pub stop_when_extinct: bool,
}

impl Default for TerminationPolicy {
    fn default() -> Self {
        Self {
            tick_budget: 200_000,
            stop_when_full: false,
            stop_when_extinct: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    BudgetExhausted,
    GridFull,
    Extinct,
}

impl TerminationPolicy {
    /// Checked after each completed tick; `ticks_completed` counts it.
    pub fn stop_reason(&self, ticks_completed: u64, lattice: &Lattice) -> Option<StopReason> {
        if self.stop_when_full && lattice.is_full() {
            return Some(StopReason::GridFull);
        }
        if self.stop_when_extinct && lattice.counts().occupied == 0 {
            return Some(StopReason::Extinct);
        }
        if ticks_completed >= self.tick_budget {
            return Some(StopReason::BudgetExhausted);
        }
        None
    }
}

/// Timer-advance phase.
pub fn advance_timers(lattice: &mut Lattice) {
    lattice.advance_timers();
}

/// Reaction phase: visits every site once in row-major order, mutating in
/// place. Daughters placed ahead of the scan are visited in the same sweep.
pub fn react<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    config: &SimulationConfig,
    rng: &mut R,
) -> SweepSummary {
    let mut summary = SweepSummary::default();
    let side = lattice.side();
    for y in 0..side {
        for x in 0..side {
            let outcome = update_site(lattice, UVec2::new(x, y), config, rng);
            summary.absorb(outcome);
        }
    }
    summary
}

/// One full tick: advance timers, then sweep.
pub fn step<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    config: &SimulationConfig,
    rng: &mut R,
) -> SweepSummary {
    advance_timers(lattice);
    react(lattice, config, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{Strain, StrainCount};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn lone_lytic_cell_bursts_on_schedule() {
        let config = SimulationConfig::default();
        let mut lattice = Lattice::new(5);
        let center = UVec2::new(2, 2);
        lattice.place(center, Occupant::LyticA);
        lattice.site_mut(center).expect("in bounds").lytic_clock =
            Some(config.strain_a.lysis_burst_time - 1);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let summary = step(&mut lattice, &config, &mut rng);
        assert_eq!(summary.deaths, 1);
        assert_eq!(summary.bursts, 1);
        assert!(lattice.is_free(center));
        assert_eq!(lattice.counts().lytic_a, 0);

        let seeded = lattice
            .sites()
            .iter()
            .filter(|site| site.exposure == StrainCount::new(Strain::A, 3))
            .count();
        assert_eq!(seeded, 8);
    }

    #[test]
    fn surviving_cells_age_by_one_per_tick() {
        let config = SimulationConfig::default();
        let mut lattice = Lattice::new(4);
        let pos = UVec2::new(3, 3);
        lattice.place(pos, Occupant::Healthy);
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        for expected in 1..=10 {
            step(&mut lattice, &config, &mut rng);
            assert_eq!(lattice.site(pos).and_then(|s| s.age), Some(expected));
        }
    }

    #[test]
    fn lone_cell_divides_within_its_first_growth_cycle() {
        let config = SimulationConfig::default();
        let mut lattice = Lattice::new(6);
        lattice.place(UVec2::new(3, 3), Occupant::Healthy);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let window = config.healthy_growth_rate - config.birth_time_range;
        let latest = window + 2 * config.birth_time_range;
        let mut births = 0;
        for _ in 0..latest {
            births += step(&mut lattice, &config, &mut rng).births;
        }
        assert_eq!(births, 1);
        assert_eq!(lattice.counts().occupied, 2);
        assert_eq!(lattice.counts().healthy(), 2);
    }

    #[test]
    fn counters_match_a_full_scan_over_a_long_run() {
        let mut config = SimulationConfig {
            lattice_size: 12,
            decision_time: 5,
            ..SimulationConfig::default()
        };
        config.strain_a.lysis_burst_time = 30;
        config.strain_b.lysis_burst_time = 45;
        let mut lattice = Lattice::new(config.lattice_size);
        lattice.place(UVec2::new(3, 3), Occupant::Healthy);
        lattice.place(UVec2::new(8, 8), Occupant::LyticA);
        lattice.place(UVec2::new(8, 3), Occupant::LyticB);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        for _ in 0..400 {
            step(&mut lattice, &config, &mut rng);
            assert_eq!(lattice.counts(), lattice.scan_counts());
        }
    }

    #[test]
    fn budget_and_early_exit_flags_are_independent() {
        let mut lattice = Lattice::new(1);
        let policy = TerminationPolicy {
            tick_budget: 5,
            ..TerminationPolicy::default()
        };
        assert_eq!(policy.stop_reason(4, &lattice), None);
        assert_eq!(policy.stop_reason(5, &lattice), Some(StopReason::BudgetExhausted));

        let extinct = TerminationPolicy {
            stop_when_extinct: true,
            ..policy
        };
        assert_eq!(extinct.stop_reason(1, &lattice), Some(StopReason::Extinct));

        lattice.place(UVec2::ZERO, Occupant::Healthy);
        let full = TerminationPolicy {
            stop_when_full: true,
            ..policy
        };
        assert_eq!(full.stop_reason(1, &lattice), Some(StopReason::GridFull));
        assert_eq!(policy.stop_reason(1, &lattice), None);
    }
}
