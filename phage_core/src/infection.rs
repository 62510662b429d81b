use bevy::math::UVec2;
use tracing::trace;

use crate::{
    lattice::Lattice,
    neighbors::MOORE,
    site::{Strain, StrainCount},
};

/// Seeds exposure on the Moore ring around a bursting cell.
///
/// Every in-bounds neighbor without pending exposure receives `tries`
/// attempts tagged with `strain`, whether or not it is occupied. Existing
/// exposure is never overwritten or topped up. Returns the number of sites
/// that were seeded.
pub fn propagate_burst(lattice: &mut Lattice, origin: UVec2, strain: Strain, tries: u32) -> usize {
    let pressure = StrainCount::new(strain, tries);
    if pressure.is_clear() {
        return 0;
    }

    let mut seeded = 0;
    for delta in MOORE {
        let Some(target) = lattice.offset(origin, delta) else {
            continue;
        };
        if let Some(site) = lattice.site_mut(target) {
            if site.exposure.is_clear() {
                site.exposure = pressure;
                seeded += 1;
            }
        }
    }

    trace!(
        target: "phage::lifecycle",
        x = origin.x,
        y = origin.y,
        ?strain,
        seeded,
        "burst.propagated"
    );
    seeded
}
