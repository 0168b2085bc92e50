//! Seeded random stream for bounce variation
//!
//! Wraps `Pcg32` so the rest of the simulation only sees `[0, 1)` floats.
//! Same seed and same call sequence always yield the same values.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Deterministic per-attempt random stream
#[derive(Debug, Clone)]
pub struct SeededRng {
    inner: Pcg32,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg32::seed_from_u64(seed),
        }
    }

    /// Next value in [0, 1)
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        self.inner.random::<f32>()
    }

    /// Next value in [-1, 1)
    #[inline]
    pub fn next_signed(&mut self) -> f32 {
        self.next_f32() * 2.0 - 1.0
    }
}
