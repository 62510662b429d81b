use bevy::{
    math::{IVec2, UVec2},
    prelude::Resource,
};
use serde::Serialize;

use crate::site::{Occupant, Site};

/// Population tallies maintained incrementally as sites change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PopulationCounts {
    pub occupied: u64,
    pub lysogenic_a: u64,
    pub lytic_a: u64,
    pub lysogenic_b: u64,
    pub lytic_b: u64,
}

impl PopulationCounts {
    pub fn infected(&self) -> u64 {
        self.lysogenic_a + self.lytic_a + self.lysogenic_b + self.lytic_b
    }

    pub fn healthy(&self) -> u64 {
        self.occupied.saturating_sub(self.infected())
    }

    fn infected_slot(&mut self, occupant: Occupant) -> Option<&mut u64> {
        match occupant {
            Occupant::LysogenicA => Some(&mut self.lysogenic_a),
            Occupant::LyticA => Some(&mut self.lytic_a),
            Occupant::LysogenicB => Some(&mut self.lysogenic_b),
            Occupant::LyticB => Some(&mut self.lytic_b),
            Occupant::Empty | Occupant::Healthy => None,
        }
    }

    fn add(&mut self, occupant: Occupant) {
        if !occupant.is_occupied() {
            return;
        }
        self.occupied += 1;
        if let Some(slot) = self.infected_slot(occupant) {
            *slot += 1;
        }
    }

    fn remove(&mut self, occupant: Occupant) {
        if !occupant.is_occupied() {
            return;
        }
        self.occupied = self.occupied.saturating_sub(1);
        if let Some(slot) = self.infected_slot(occupant) {
            *slot = slot.saturating_sub(1);
        }
    }

    fn convert(&mut self, from: Occupant, to: Occupant) {
        if let Some(slot) = self.infected_slot(from) {
            *slot = slot.saturating_sub(1);
        }
        if let Some(slot) = self.infected_slot(to) {
            *slot += 1;
        }
    }
}

/// Square grid of sites stored row-major, plus its aggregate counters.
///
/// Positions are `UVec2 { x: column, y: row }`. Every accessor is bounds
/// checked and returns `None` off the grid.
#[derive(Resource, Debug, Clone)]
pub struct Lattice {
    side: u32,
    sites: Vec<Site>,
    counts: PopulationCounts,
    deaths: u64,
}

impl Lattice {
    pub fn new(side: u32) -> Self {
        let total = (side as usize) * (side as usize);
        Self {
            side,
            sites: vec![Site::default(); total],
            counts: PopulationCounts::default(),
            deaths: 0,
        }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn capacity(&self) -> u64 {
        self.sites.len() as u64
    }

    pub fn index(&self, pos: UVec2) -> Option<usize> {
        if pos.x < self.side && pos.y < self.side {
            Some((pos.y * self.side + pos.x) as usize)
        } else {
            None
        }
    }

    /// Shifts `pos` by `delta`, or `None` if the result leaves the grid.
    pub fn offset(&self, pos: UVec2, delta: IVec2) -> Option<UVec2> {
        let x = i64::from(pos.x) + i64::from(delta.x);
        let y = i64::from(pos.y) + i64::from(delta.y);
        let side = i64::from(self.side);
        if (0..side).contains(&x) && (0..side).contains(&y) {
            Some(UVec2::new(x as u32, y as u32))
        } else {
            None
        }
    }

    pub fn site(&self, pos: UVec2) -> Option<&Site> {
        self.index(pos).and_then(|idx| self.sites.get(idx))
    }

    /// Raw write access. Counters are not adjusted; use [`Lattice::place`]
    /// to change occupancy.
    pub fn site_mut(&mut self, pos: UVec2) -> Option<&mut Site> {
        let idx = self.index(pos)?;
        self.sites.get_mut(idx)
    }

    /// Iterates every position in row-major scan order.
    pub fn positions(&self) -> impl Iterator<Item = UVec2> {
        let side = self.side;
        (0..side).flat_map(move |y| (0..side).map(move |x| UVec2::new(x, y)))
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn counts(&self) -> PopulationCounts {
        self.counts
    }

    /// Cumulative number of deaths since the lattice was created.
    pub fn deaths(&self) -> u64 {
        self.deaths
    }

    pub fn is_full(&self) -> bool {
        self.counts.occupied == self.capacity()
    }

    pub fn is_free(&self, pos: UVec2) -> bool {
        self.site(pos).is_some_and(Site::is_empty)
    }

    /// Places a newborn `occupant` on a free site. Returns `false` without
    /// touching anything if the site is off the grid or already occupied.
    pub fn place(&mut self, pos: UVec2, occupant: Occupant) -> bool {
        if !occupant.is_occupied() {
            return false;
        }
        let Some(site) = self.site_mut(pos) else {
            return false;
        };
        if !site.is_empty() {
            return false;
        }
        *site = Site::newborn(occupant, site.exposure);
        self.counts.add(occupant);
        true
    }

    /// Commits a healthy cell to an infected fate.
    pub(crate) fn commit(&mut self, pos: UVec2, fate: Occupant) {
        let Some(site) = self.site_mut(pos) else {
            return;
        };
        let previous = site.occupant;
        site.occupant = fate;
        site.decision = Default::default();
        site.multiplicity = Default::default();
        if fate.is_lytic() {
            site.lytic_clock = Some(0);
        }
        self.counts.convert(previous, fate);
    }

    /// Kills whatever occupies `pos` and resets the site entirely.
    pub(crate) fn vacate(&mut self, pos: UVec2) -> Option<Occupant> {
        let site = self.site_mut(pos)?;
        let occupant = site.occupant;
        if !occupant.is_occupied() {
            return None;
        }
        *site = Site::default();
        self.counts.remove(occupant);
        self.deaths += 1;
        Some(occupant)
    }

    /// Timer-advance phase of a tick.
    pub fn advance_timers(&mut self) {
        for site in &mut self.sites {
            site.advance_timers();
        }
    }

    /// Recounts the population with a full scan.
    pub fn scan_counts(&self) -> PopulationCounts {
        let mut counts = PopulationCounts::default();
        for site in &self.sites {
            counts.add(site.occupant);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{Strain, StrainCount};

    #[test]
    fn index_is_row_major_and_bounds_checked() {
        let lattice = Lattice::new(4);
        assert_eq!(lattice.index(UVec2::new(1, 2)), Some(9));
        assert_eq!(lattice.index(UVec2::new(4, 0)), None);
        assert_eq!(lattice.offset(UVec2::new(0, 0), IVec2::new(-1, 0)), None);
        assert_eq!(
            lattice.offset(UVec2::new(3, 3), IVec2::new(-1, -1)),
            Some(UVec2::new(2, 2))
        );
    }

    #[test]
    fn positions_follow_scan_order() {
        let lattice = Lattice::new(2);
        let order: Vec<UVec2> = lattice.positions().collect();
        assert_eq!(
            order,
            vec![
                UVec2::new(0, 0),
                UVec2::new(1, 0),
                UVec2::new(0, 1),
                UVec2::new(1, 1)
            ]
        );
    }

    #[test]
    fn place_refuses_occupied_and_off_grid_sites() {
        let mut lattice = Lattice::new(3);
        assert!(lattice.place(UVec2::new(1, 1), Occupant::Healthy));
        assert!(!lattice.place(UVec2::new(1, 1), Occupant::LysogenicA));
        assert!(!lattice.place(UVec2::new(3, 1), Occupant::Healthy));
        assert!(!lattice.place(UVec2::new(0, 0), Occupant::Empty));
        assert_eq!(lattice.counts().occupied, 1);
        assert_eq!(lattice.counts().healthy(), 1);
    }

    #[test]
    fn place_keeps_pending_exposure() {
        let mut lattice = Lattice::new(3);
        let pos = UVec2::new(0, 2);
        lattice.site_mut(pos).expect("in bounds").exposure = StrainCount::new(Strain::B, 3);
        assert!(lattice.place(pos, Occupant::Healthy));
        let site = lattice.site(pos).expect("in bounds");
        assert_eq!(site.exposure, StrainCount::B(3));
        assert_eq!(site.age, Some(0));
        assert_eq!(site.birth_countdown, None);
    }

    #[test]
    fn vacate_resets_every_field() {
        let mut lattice = Lattice::new(3);
        let pos = UVec2::new(2, 2);
        lattice.place(pos, Occupant::LyticA);
        {
            let site = lattice.site_mut(pos).expect("in bounds");
            site.exposure = StrainCount::A(2);
            site.birth_countdown = Some(1);
        }
        assert_eq!(lattice.vacate(pos), Some(Occupant::LyticA));
        assert_eq!(lattice.site(pos), Some(&Site::default()));
        assert_eq!(lattice.counts(), PopulationCounts::default());
        assert_eq!(lattice.deaths(), 1);
        assert_eq!(lattice.vacate(pos), None);
        assert_eq!(lattice.deaths(), 1);
    }

    #[test]
    fn commit_moves_cell_between_categories() {
        let mut lattice = Lattice::new(3);
        let pos = UVec2::new(1, 0);
        lattice.place(pos, Occupant::Healthy);
        lattice.commit(pos, Occupant::LyticB);
        let counts = lattice.counts();
        assert_eq!(counts.occupied, 1);
        assert_eq!(counts.lytic_b, 1);
        assert_eq!(counts.healthy(), 0);
        assert_eq!(lattice.site(pos).and_then(|s| s.lytic_clock), Some(0));
        assert_eq!(counts, lattice.scan_counts());
    }

    #[test]
    fn full_lattice_is_detected() {
        let mut lattice = Lattice::new(2);
        let positions: Vec<UVec2> = lattice.positions().collect();
        for pos in positions {
            assert!(!lattice.is_full());
            lattice.place(pos, Occupant::Healthy);
        }
        assert!(lattice.is_full());
    }
}
