use bevy::prelude::*;
use tracing::debug;

use crate::{
    lattice::Lattice,
    resources::{SimRng, SimulationConfig, SimulationTick, SweepTelemetry},
    scheduler,
};

pub fn advance_timers(mut lattice: ResMut<Lattice>) {
    scheduler::advance_timers(&mut lattice);
}

pub fn react_sites(
    mut lattice: ResMut<Lattice>,
    config: Res<SimulationConfig>,
    mut rng: ResMut<SimRng>,
    mut telemetry: ResMut<SweepTelemetry>,
    tick: Res<SimulationTick>,
) {
    let summary = scheduler::react(&mut lattice, &config, &mut rng.0);
    telemetry.last = summary;

    let counts = lattice.counts();
    debug!(
        target: "phage::scheduler",
        tick = tick.0,
        occupied = counts.occupied,
        deaths = summary.deaths,
        bursts = summary.bursts,
        births = summary.births,
        lysogenic_commitments = summary.lysogenic_commitments,
        lytic_commitments = summary.lytic_commitments,
        "tick.swept"
    );
}

pub fn advance_tick(mut tick: ResMut<SimulationTick>) {
    tick.0 = tick.0.wrapping_add(1);
}
