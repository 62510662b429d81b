use bevy::math::UVec2;
use rand::Rng;
use tracing::trace;

use crate::{
    decision::resolve_exposure,
    infection::propagate_burst,
    lattice::Lattice,
    neighbors::select_free_neighbor,
    resources::SimulationConfig,
    site::{Occupant, Site},
};

/// What happened to a site during its reaction-phase visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteOutcome {
    Vacant,
    Died {
        occupant: Occupant,
        burst: bool,
    },
    Lived {
        committed: Option<Occupant>,
        daughter: Option<UVec2>,
    },
}

/// Whether the occupant reached its death or burst threshold this tick.
pub fn is_due_to_die(site: &Site, config: &SimulationConfig) -> bool {
    match site.occupant {
        Occupant::Empty => false,
        Occupant::Healthy => site.age == Some(config.healthy_death_time),
        Occupant::LysogenicA => site.age == Some(config.strain_a.lysogenic_death_time),
        Occupant::LysogenicB => site.age == Some(config.strain_b.lysogenic_death_time),
        Occupant::LyticA => site.lytic_clock == Some(config.strain_a.lysis_burst_time),
        Occupant::LyticB => site.lytic_clock == Some(config.strain_b.lysis_burst_time),
    }
}

/// Applies the full lifecycle to one site: death, exposure and decision,
/// birth-countdown arming, then reproduction.
pub fn update_site<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    pos: UVec2,
    config: &SimulationConfig,
    rng: &mut R,
) -> SiteOutcome {
    let Some(site) = lattice.site(pos).copied() else {
        return SiteOutcome::Vacant;
    };
    if site.is_empty() {
        return SiteOutcome::Vacant;
    }

    if is_due_to_die(&site, config) {
        return kill(lattice, pos, site.occupant, config);
    }

    let committed = resolve_exposure(lattice, pos, config, rng);
    arm_birth_countdown(lattice, pos, config, rng);
    let daughter = try_reproduce(lattice, pos, rng);

    SiteOutcome::Lived {
        committed,
        daughter,
    }
}

fn kill(
    lattice: &mut Lattice,
    pos: UVec2,
    occupant: Occupant,
    config: &SimulationConfig,
) -> SiteOutcome {
    let burst = match occupant.strain() {
        Some(strain) if occupant.is_lytic() => {
            propagate_burst(lattice, pos, strain, config.strain(strain).exposure_tries);
            true
        }
        _ => false,
    };
    lattice.vacate(pos);
    trace!(
        target: "phage::lifecycle",
        x = pos.x,
        y = pos.y,
        ?occupant,
        burst,
        "site.died"
    );
    SiteOutcome::Died { occupant, burst }
}

/// Arms the birth countdown once per growth cycle, a jitter window before
/// the cycle boundary. Returns the armed value.
pub fn arm_birth_countdown<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    pos: UVec2,
    config: &SimulationConfig,
    rng: &mut R,
) -> Option<u32> {
    let site = lattice.site_mut(pos)?;
    if site.birth_countdown.is_some() {
        return None;
    }
    let growth_rate = config.growth_rate(site.occupant)?;
    let age = site.age.filter(|age| *age != 0)?;
    let window = growth_rate.checked_sub(config.birth_time_range)?;
    if age % growth_rate != window {
        return None;
    }

    let countdown = rng.gen_range(0..=2 * config.birth_time_range);
    site.birth_countdown = Some(countdown);
    Some(countdown)
}

/// Places a daughter in a random free orthogonal neighbor when the parent's
/// countdown has run out. The parent's countdown is left as is either way.
pub fn try_reproduce<R: Rng + ?Sized>(
    lattice: &mut Lattice,
    pos: UVec2,
    rng: &mut R,
) -> Option<UVec2> {
    let site = *lattice.site(pos)?;
    let ready = site.birth_countdown == Some(0)
        && site.age.is_some_and(|age| age != 0)
        && site.is_stable()
        && site.occupant.can_reproduce();
    if !ready {
        return None;
    }

    let target = select_free_neighbor(lattice, pos, rng)?;
    lattice.place(target, site.occupant).then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{Strain, StrainCount};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn healthy_cell_dies_exactly_at_its_death_time() {
        let config = SimulationConfig::default();
        let mut lattice = Lattice::new(3);
        let pos = UVec2::new(1, 1);
        lattice.place(pos, Occupant::Healthy);
        lattice.site_mut(pos).expect("in bounds").age = Some(config.healthy_death_time - 1);
        let mut rng = rng();

        assert!(matches!(
            update_site(&mut lattice, pos, &config, &mut rng),
            SiteOutcome::Lived { .. }
        ));

        lattice.site_mut(pos).expect("in bounds").age = Some(config.healthy_death_time);
        assert_eq!(
            update_site(&mut lattice, pos, &config, &mut rng),
            SiteOutcome::Died {
                occupant: Occupant::Healthy,
                burst: false
            }
        );
        assert_eq!(lattice.site(pos), Some(&Site::default()));
        assert_eq!(lattice.counts().occupied, 0);
        assert_eq!(lattice.deaths(), 1);
    }

    #[test]
    fn lysogen_uses_its_strain_death_time() {
        let mut config = SimulationConfig::default();
        config.strain_b.lysogenic_death_time = 7;
        let mut lattice = Lattice::new(2);
        let pos = UVec2::new(0, 0);
        lattice.place(pos, Occupant::LysogenicB);
        lattice.site_mut(pos).expect("in bounds").age = Some(7);
        let outcome = update_site(&mut lattice, pos, &config, &mut rng());
        assert!(matches!(outcome, SiteOutcome::Died { burst: false, .. }));
        assert_eq!(lattice.counts().lysogenic_b, 0);
    }

    #[test]
    fn lytic_burst_seeds_neighbors_before_clearing() {
        let config = SimulationConfig::default();
        let mut lattice = Lattice::new(3);
        let pos = UVec2::new(1, 1);
        lattice.place(pos, Occupant::LyticB);
        lattice.place(UVec2::new(0, 0), Occupant::Healthy);
        lattice.site_mut(pos).expect("in bounds").lytic_clock = Some(config.strain_b.lysis_burst_time);

        let outcome = update_site(&mut lattice, pos, &config, &mut rng());
        assert_eq!(
            outcome,
            SiteOutcome::Died {
                occupant: Occupant::LyticB,
                burst: true
            }
        );
        assert_eq!(
            lattice.site(UVec2::new(0, 0)).map(|s| s.exposure),
            Some(StrainCount::B(config.strain_b.exposure_tries))
        );
        // The bursting site itself is fully reset.
        assert!(lattice.site(pos).expect("in bounds").exposure.is_clear());
        assert_eq!(lattice.counts().lytic_b, 0);
    }

    #[test]
    fn countdown_arms_once_in_the_jitter_window() {
        let config = SimulationConfig::default();
        let mut lattice = Lattice::new(3);
        let pos = UVec2::new(1, 1);
        lattice.place(pos, Occupant::Healthy);
        let mut rng = rng();

        let window = config.healthy_growth_rate - config.birth_time_range;
        lattice.site_mut(pos).expect("in bounds").age = Some(window - 1);
        assert_eq!(arm_birth_countdown(&mut lattice, pos, &config, &mut rng), None);

        lattice.site_mut(pos).expect("in bounds").age = Some(window);
        let armed = arm_birth_countdown(&mut lattice, pos, &config, &mut rng).expect("armed");
        assert!(armed <= 2 * config.birth_time_range);

        // Already armed: no re-roll.
        assert_eq!(arm_birth_countdown(&mut lattice, pos, &config, &mut rng), None);

        // The next cycle's window arms again once the countdown has lapsed.
        let site = lattice.site_mut(pos).expect("in bounds");
        site.birth_countdown = None;
        site.age = Some(window + config.healthy_growth_rate);
        assert!(arm_birth_countdown(&mut lattice, pos, &config, &mut rng).is_some());
    }

    #[test]
    fn lytic_cells_never_arm() {
        let config = SimulationConfig::default();
        let mut lattice = Lattice::new(3);
        let pos = UVec2::new(1, 1);
        lattice.place(pos, Occupant::LyticA);
        lattice.site_mut(pos).expect("in bounds").age =
            Some(config.healthy_growth_rate - config.birth_time_range);
        assert_eq!(arm_birth_countdown(&mut lattice, pos, &config, &mut rng()), None);
    }

    #[test]
    fn ready_parent_places_a_copy_of_itself() {
        let mut lattice = Lattice::new(3);
        let pos = UVec2::new(1, 1);
        lattice.place(pos, Occupant::LysogenicA);
        {
            let site = lattice.site_mut(pos).expect("in bounds");
            site.age = Some(28);
            site.birth_countdown = Some(0);
        }

        let daughter = try_reproduce(&mut lattice, pos, &mut rng()).expect("room to divide");
        let child = lattice.site(daughter).expect("in bounds");
        assert_eq!(child.occupant, Occupant::LysogenicA);
        assert_eq!(child.age, Some(0));
        assert_eq!(child.birth_countdown, None);
        assert_eq!(lattice.counts().lysogenic_a, 2);
        assert_eq!(lattice.counts().occupied, 2);
        // The parent's countdown is untouched by the placement.
        assert_eq!(lattice.site(pos).and_then(|s| s.birth_countdown), Some(0));
    }

    #[test]
    fn boxed_in_parent_fails_silently() {
        let mut lattice = Lattice::new(3);
        let pos = UVec2::new(0, 0);
        lattice.place(pos, Occupant::Healthy);
        lattice.place(UVec2::new(1, 0), Occupant::Healthy);
        lattice.place(UVec2::new(0, 1), Occupant::Healthy);
        {
            let site = lattice.site_mut(pos).expect("in bounds");
            site.age = Some(18);
            site.birth_countdown = Some(0);
        }
        assert_eq!(try_reproduce(&mut lattice, pos, &mut rng()), None);
        assert_eq!(lattice.counts().occupied, 3);
        assert_eq!(lattice.site(pos).and_then(|s| s.birth_countdown), Some(0));
    }

    #[test]
    fn pending_exposure_blocks_division() {
        let mut lattice = Lattice::new(3);
        let pos = UVec2::new(1, 1);
        lattice.place(pos, Occupant::Healthy);
        {
            let site = lattice.site_mut(pos).expect("in bounds");
            site.age = Some(18);
            site.birth_countdown = Some(0);
            site.exposure = StrainCount::new(Strain::A, 2);
        }
        assert_eq!(try_reproduce(&mut lattice, pos, &mut rng()), None);
        assert_eq!(lattice.counts().occupied, 1);
    }

    #[test]
    fn newborns_do_not_divide() {
        let mut lattice = Lattice::new(3);
        let pos = UVec2::new(1, 1);
        lattice.place(pos, Occupant::Healthy);
        lattice.site_mut(pos).expect("in bounds").birth_countdown = Some(0);
        assert_eq!(try_reproduce(&mut lattice, pos, &mut rng()), None);
    }
}
