//! Core simulation crate for the two-phage colony lattice.
//!
//! Healthy bacteria grow on a square lattice while two temperate phage
//! strains compete to infect them. Each infection resolves to lysogeny or
//! lysis depending on the multiplicity of infection. The state lives in Bevy
//! ECS resources and one call to [`run_tick`] advances the lattice by one
//! tick.

pub mod colony_config;
pub mod decision;
pub mod digest;
pub mod infection;
pub mod lattice;
pub mod lifecycle;
pub mod metrics;
pub mod neighbors;
mod resources;
pub mod scheduler;
pub mod seeding;
pub mod site;
mod systems;
pub mod tournament;

use bevy::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

pub use colony_config::{ConfigError, BUILTIN_COLONY_CONFIG};
pub use decision::LysogenyProfile;
pub use digest::lattice_digest;
pub use lattice::{Lattice, PopulationCounts};
pub use metrics::{
    CsvMetricsWriter, DiscardMetrics, MemoryMetricsSink, MetricsError, MetricsSink,
    SimulationMetrics, TickRecord, CSV_HEADER,
};
pub use resources::{SimRng, SimulationConfig, SimulationTick, StrainParams, SweepTelemetry};
pub use scheduler::{StopReason, SweepSummary, TerminationPolicy};
pub use seeding::{seed_colony, ColonySeed, SeedError};
pub use site::{Occupant, Site, Strain, StrainCount};
pub use tournament::{CompetitionOutcome, Tournament, TournamentError, TournamentRound, Winner};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to seed initial colony: {0}")]
    Seed(#[from] SeedError),
}

/// Construct a Bevy [`App`] holding a freshly seeded lattice.
///
/// The config is validated and every initial colony placed before the app is
/// returned, so a bad colony list surfaces here rather than mid-run.
pub fn build_headless_app(config: SimulationConfig) -> Result<App, SetupError> {
    config.validate()?;

    let mut lattice = Lattice::new(config.lattice_size);
    let colonies = config.initial_colonies();
    for colony in &colonies {
        seed_colony(&mut lattice, colony)?;
    }

    info!(
        target: "phage::setup",
        lattice_size = config.lattice_size,
        seed = config.seed,
        colonies = colonies.len(),
        occupied = lattice.counts().occupied,
        "simulation.ready"
    );

    let mut app = App::new();
    app.insert_resource(SimRng::from_seed(config.seed))
        .insert_resource(config)
        .insert_resource(lattice)
        .insert_resource(SimulationTick::default())
        .insert_resource(SimulationMetrics::default())
        .insert_resource(SweepTelemetry::default())
        .add_plugins(MinimalPlugins)
        .add_systems(
            Update,
            (
                systems::advance_timers,
                systems::react_sites,
                metrics::collect_metrics,
                systems::advance_tick,
            )
                .chain(),
        );

    Ok(app)
}

/// Execute a single tick and return its metrics record.
///
/// Each call runs the chained systems configured in [`build_headless_app`]
/// (timers → reaction sweep → metrics → tick increment).
pub fn run_tick(app: &mut App) -> TickRecord {
    app.update();
    app.world
        .resource::<SimulationMetrics>()
        .latest
        .unwrap_or_default()
}

/// How a call to [`run_simulation`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub final_record: Option<TickRecord>,
    pub stop_reason: StopReason,
    pub deaths: u64,
}

/// Runs ticks until the configured [`TerminationPolicy`] says stop, feeding
/// every record to `sink`.
pub fn run_simulation(
    app: &mut App,
    sink: &mut dyn MetricsSink,
) -> Result<RunSummary, MetricsError> {
    let policy = app.world.resource::<SimulationConfig>().termination;
    let mut ticks_run = 0;
    let mut final_record = None;

    let stop_reason = if policy.tick_budget == 0 {
        StopReason::BudgetExhausted
    } else {
        loop {
            let record = run_tick(app);
            sink.record(&record)?;
            final_record = Some(record);
            ticks_run += 1;
            if let Some(reason) = policy.stop_reason(ticks_run, app.world.resource::<Lattice>()) {
                break reason;
            }
        }
    };
    sink.finish()?;

    let deaths = app.world.resource::<Lattice>().deaths();
    info!(
        target: "phage::scheduler",
        ticks_run,
        ?stop_reason,
        deaths,
        "run.completed"
    );

    Ok(RunSummary {
        ticks_run,
        final_record,
        stop_reason,
        deaths,
    })
}
