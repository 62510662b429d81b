use std::hash::{Hash, Hasher};

use crate::lattice::Lattice;

/// FNV-1a over 64 bits. `DefaultHasher` is seeded per process and cannot
/// compare lattices across runs.
struct Fnv1a(u64);

impl Fnv1a {
    fn new() -> Self {
        Self(0xcbf2_9ce4_8422_2325)
    }
}

impl Hasher for Fnv1a {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        self.0 = bytes.iter().fold(self.0, |state, byte| {
            (state ^ u64::from(*byte)).wrapping_mul(0x100_0000_01b3)
        });
    }
}

/// Fingerprint of the full lattice state: side length, every site in scan
/// order, and the cumulative death count. Stable across processes.
pub fn lattice_digest(lattice: &Lattice) -> u64 {
    let mut hasher = Fnv1a::new();
    lattice.side().hash(&mut hasher);
    lattice.sites().hash(&mut hasher);
    lattice.deaths().hash(&mut hasher);
    hasher.finish()
}
