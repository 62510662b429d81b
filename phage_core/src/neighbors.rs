use bevy::math::{IVec2, UVec2};
use rand::Rng;

use crate::lattice::Lattice;

/// Von Neumann offsets in probe order: up, right, down, left.
pub const ORTHOGONAL: [IVec2; 4] = [
    IVec2::new(0, -1),
    IVec2::new(1, 0),
    IVec2::new(0, 1),
    IVec2::new(-1, 0),
];

/// Moore offsets: the orthogonal ring plus the four diagonals.
pub const MOORE: [IVec2; 8] = [
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(1, -1),
    IVec2::new(-1, 0),
    IVec2::new(1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, 1),
    IVec2::new(1, 1),
];

/// Free orthogonal neighbors of a site, in probe order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeNeighbors {
    slots: [UVec2; 4],
    len: usize,
}

impl FreeNeighbors {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[UVec2] {
        &self.slots[..self.len]
    }

    fn push(&mut self, pos: UVec2) {
        self.slots[self.len] = pos;
        self.len += 1;
    }
}

/// Collects the in-bounds, empty orthogonal neighbors of `pos`.
pub fn free_orthogonal(lattice: &Lattice, pos: UVec2) -> FreeNeighbors {
    let mut free = FreeNeighbors::default();
    for delta in ORTHOGONAL {
        if let Some(neighbor) = lattice.offset(pos, delta) {
            if lattice.is_free(neighbor) {
                free.push(neighbor);
            }
        }
    }
    free
}

/// Draws one free orthogonal neighbor uniformly, or `None` when boxed in.
/// No random draw is consumed when nothing is free.
pub fn select_free_neighbor<R: Rng + ?Sized>(
    lattice: &Lattice,
    pos: UVec2,
    rng: &mut R,
) -> Option<UVec2> {
    let free = free_orthogonal(lattice, pos);
    if free.is_empty() {
        return None;
    }
    let choice = rng.gen_range(0..free.len());
    free.as_slice().get(choice).copied()
}
