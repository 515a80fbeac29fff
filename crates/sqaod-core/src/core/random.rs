use super::real::Real;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Seedable pseudo-random source owned by a single solver.
#[derive(Debug, Clone)]
pub struct Random {
    rng: StdRng,
}

impl Default for Random {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Random {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Reseeds from the wall clock and returns the seed used, so a run can be replayed.
    pub fn seed_from_time(&mut self) -> u64 {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
            .unwrap_or_default();
        debug!(seed, "Seeding random engine from the system clock.");
        self.seed(seed);
        seed
    }

    /// Uniform integer in `[0, n)`. `n` must be positive.
    #[inline]
    pub fn rand_int(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// Uniform real in `[0, 1)`.
    #[inline]
    pub fn random<R: Real>(&mut self) -> R {
        R::sample_unit(&mut self.rng)
    }
}
