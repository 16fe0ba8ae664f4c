//! Release-curve jitter
//!
//! Seeded or entropy-backed draws added to the curve ratio when `Randomize`
//! is set.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Per-instance source of the release-curve jitter.
///
/// Each algorithm instance owns one, so instances never share random state.
/// Backtests seed it for reproducible runs.
#[derive(Debug, Clone)]
pub struct RandomPerturbation {
    rng: StdRng,
}

impl RandomPerturbation {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Uniform draw in [-0.01, 0.01)
    pub fn sample(&mut self) -> f64 {
        self.rng.gen_range(-0.01..0.01)
    }
}
