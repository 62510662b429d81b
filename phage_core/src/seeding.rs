use bevy::math::{IVec2, UVec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{lattice::Lattice, site::Occupant};

const ISLAND_FLANKS: [IVec2; 4] = [
    IVec2::new(-1, -1),
    IVec2::new(1, -1),
    IVec2::new(-1, 1),
    IVec2::new(1, 1),
];

/// An X-shaped starting island: `center` flanked by four diagonal healthy cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColonySeed {
    pub row: u32,
    pub col: u32,
    pub center: Occupant,
}

impl ColonySeed {
    pub fn new(row: u32, col: u32, center: Occupant) -> Self {
        Self { row, col, center }
    }

    pub fn position(&self) -> UVec2 {
        UVec2::new(self.col, self.row)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SeedError {
    #[error("colony centered at row {row}, col {col} does not fit on a {side}x{side} lattice")]
    OutOfBounds { row: u32, col: u32, side: u32 },
    #[error("colony cell at row {row}, col {col} is already occupied")]
    Occupied { row: u32, col: u32 },
    #[error("colony centered at row {row}, col {col} has an empty center")]
    EmptyCenter { row: u32, col: u32 },
}

/// Strain B island at the upper quarter point, strain A island at the lower one.
pub fn default_colonies(side: u32) -> Vec<ColonySeed> {
    vec![
        ColonySeed::new(side / 4, side / 4, Occupant::LyticB),
        ColonySeed::new(3 * side / 4, 3 * side / 4, Occupant::LyticA),
    ]
}

/// Places one island. Nothing is written unless all five cells are free.
pub fn seed_colony(lattice: &mut Lattice, seed: &ColonySeed) -> Result<usize, SeedError> {
    if !seed.center.is_occupied() {
        return Err(SeedError::EmptyCenter {
            row: seed.row,
            col: seed.col,
        });
    }

    let center = seed.position();
    let out_of_bounds = SeedError::OutOfBounds {
        row: seed.row,
        col: seed.col,
        side: lattice.side(),
    };
    if lattice.index(center).is_none() {
        return Err(out_of_bounds);
    }

    let mut cells = vec![(center, seed.center)];
    for delta in ISLAND_FLANKS {
        let pos = lattice
            .offset(center, delta)
            .ok_or_else(|| out_of_bounds.clone())?;
        cells.push((pos, Occupant::Healthy));
    }

    if let Some((pos, _)) = cells.iter().find(|(pos, _)| !lattice.is_free(*pos)) {
        return Err(SeedError::Occupied {
            row: pos.y,
            col: pos.x,
        });
    }

    for (pos, occupant) in &cells {
        lattice.place(*pos, *occupant);
    }

    info!(
        target: "phage::setup",
        row = seed.row,
        col = seed.col,
        center = ?seed.center,
        "colony.seeded"
    );
    Ok(cells.len())
}
