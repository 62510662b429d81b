//! Repeated games between two lysogeny strategies.
//!
//! Each round runs a full simulation with the current pair of three-entry
//! lysogeny tables. The strain holding more lysogens at the end wins and keeps
//! its table; the loser restarts from a small random perturbation of the
//! winner's table. Over many rounds this is a random search for a table that
//! cannot be beaten by its neighbors.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::{
    build_headless_app, decision::LysogenyProfile, metrics::DiscardMetrics,
    metrics::MetricsError, metrics::TickRecord, resources::SimulationConfig, run_simulation,
    site::Strain, SetupError,
};

/// Table entries are probabilities in hundredths.
pub type StrategyTable = [u32; 3];

/// How far, in hundredths, a mutated entry may move from its parent.
const MUTATION_REACH: u32 = 3;
const HUNDREDTHS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Winner {
    A,
    B,
    Draw,
}

/// Lysogen standings at the end of one game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompetitionOutcome {
    pub lysogenic_a: u64,
    pub lysogenic_b: u64,
    /// `(LA - LB) / (LA + LB)`, zero when neither strain has lysogens.
    pub payoff: f64,
    pub winner: Winner,
}

impl CompetitionOutcome {
    pub fn from_counts(lysogenic_a: u64, lysogenic_b: u64) -> Self {
        let total = lysogenic_a + lysogenic_b;
        let payoff = if total == 0 {
            0.0
        } else {
            (lysogenic_a as f64 - lysogenic_b as f64) / total as f64
        };
        let winner = match lysogenic_a.cmp(&lysogenic_b) {
            std::cmp::Ordering::Greater => Winner::A,
            std::cmp::Ordering::Less => Winner::B,
            std::cmp::Ordering::Equal => Winner::Draw,
        };
        Self {
            lysogenic_a,
            lysogenic_b,
            payoff,
            winner,
        }
    }

    pub fn from_record(record: &TickRecord) -> Self {
        Self::from_counts(record.lysogenic_a, record.lysogenic_b)
    }
}

/// Snaps any profile onto a three-entry table, using its probabilities for
/// multiplicities 1 to 3.
pub fn strategy_table(profile: &LysogenyProfile) -> StrategyTable {
    [1, 2, 3].map(|m| (profile.probability(m) * HUNDREDTHS as f64).round() as u32)
}

/// The third entry also covers every higher multiplicity.
pub fn profile_from_table(table: StrategyTable) -> LysogenyProfile {
    let overrides: Vec<f64> = table
        .iter()
        .map(|h| f64::from(*h) / f64::from(HUNDREDTHS))
        .collect();
    let saturation = overrides.last().copied();
    LysogenyProfile {
        overrides,
        saturation,
    }
}

/// Moves each entry to a uniformly chosen hundredth in
/// `[entry - 3, min(entry + 3, 100))`, floored at zero.
pub fn mutate_table<R: Rng + ?Sized>(table: StrategyTable, rng: &mut R) -> StrategyTable {
    table.map(|entry| {
        let low = entry.saturating_sub(MUTATION_REACH);
        let high = (entry + MUTATION_REACH).min(HUNDREDTHS);
        if low >= high {
            entry.min(HUNDREDTHS)
        } else {
            rng.gen_range(low..high)
        }
    })
}

#[derive(Debug, Error)]
pub enum TournamentError {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
}

/// Report for one completed game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TournamentRound {
    pub round: u64,
    pub seed: u64,
    pub table_a: StrategyTable,
    pub table_b: StrategyTable,
    pub outcome: CompetitionOutcome,
    pub winning_table: StrategyTable,
}

pub struct Tournament {
    base: SimulationConfig,
    table_a: StrategyTable,
    table_b: StrategyTable,
    rng: ChaCha8Rng,
    round: u64,
}

impl Tournament {
    /// Starts from the lysogeny tables in `base`. Mutation draws come from
    /// their own stream, so the simulations see the same seeds whatever
    /// the mutation history.
    pub fn new(base: SimulationConfig) -> Self {
        let table_a = strategy_table(&base.lysogeny(Strain::A));
        let table_b = strategy_table(&base.lysogeny(Strain::B));
        let rng = ChaCha8Rng::seed_from_u64(base.seed ^ 0x9e37_79b9_7f4a_7c15);
        Self {
            base,
            table_a,
            table_b,
            rng,
            round: 0,
        }
    }

    pub fn tables(&self) -> (StrategyTable, StrategyTable) {
        (self.table_a, self.table_b)
    }

    fn round_config(&self) -> SimulationConfig {
        let mut config = self.base.clone();
        config.seed = self.base.seed.wrapping_add(self.round);
        config.strain_a.lysogeny = Some(profile_from_table(self.table_a));
        config.strain_b.lysogeny = Some(profile_from_table(self.table_b));
        config
    }

    pub fn play_round(&mut self) -> Result<TournamentRound, TournamentError> {
        let config = self.round_config();
        let seed = config.seed;
        let mut app = build_headless_app(config)?;
        let summary = run_simulation(&mut app, &mut DiscardMetrics)?;
        let outcome = summary
            .final_record
            .map(|record| CompetitionOutcome::from_record(&record))
            .unwrap_or_else(|| CompetitionOutcome::from_counts(0, 0));

        let (table_a, table_b) = (self.table_a, self.table_b);
        let winning_table = match outcome.winner {
            Winner::A => {
                self.table_b = mutate_table(table_a, &mut self.rng);
                table_a
            }
            Winner::B => {
                self.table_a = mutate_table(table_b, &mut self.rng);
                table_b
            }
            Winner::Draw => {
                self.table_b = mutate_table(table_a, &mut self.rng);
                table_b
            }
        };

        info!(
            target: "phage::tournament",
            round = self.round,
            seed,
            ?table_a,
            ?table_b,
            winner = ?outcome.winner,
            payoff = outcome.payoff,
            "round.completed"
        );

        let report = TournamentRound {
            round: self.round,
            seed,
            table_a,
            table_b,
            outcome,
            winning_table,
        };
        self.round += 1;
        Ok(report)
    }

    pub fn play(&mut self, rounds: u64) -> Result<Vec<TournamentRound>, TournamentError> {
        (0..rounds).map(|_| self.play_round()).collect()
    }
}
