//! Single randomness source for a performance
//!
//! Every random draw in humanization (noise resampling, recovery jitter,
//! control loss, chord spread, mistouch rolls) goes through one
//! `PerformanceRng`, so a seed reproduces an entire performance.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct PerformanceRng {
    inner: StdRng,
}

impl PerformanceRng {
    /// Deterministic source for reproducible performances and tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            inner: StdRng::from_entropy(),
        }
    }

    /// Uniform draw in [lo, hi); returns `lo` for an empty range
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo {
            self.inner.gen_range(lo..hi)
        } else {
            lo
        }
    }

    /// Uniform draw in [-range, range]
    pub fn symmetric(&mut self, range: f64) -> f64 {
        if range > 0.0 {
            self.inner.gen_range(-range..=range)
        } else {
            0.0
        }
    }

    /// True with probability `p` (clamped to [0, 1])
    ///
    /// Always consumes exactly one draw, so forcing a probability does not
    /// shift the rest of the random sequence.
    pub fn chance(&mut self, p: f64) -> bool {
        let roll: f64 = self.inner.gen();
        roll < p.clamp(0.0, 1.0)
    }

    /// +1 or -1 with equal probability
    pub fn sign(&mut self) -> i16 {
        if self.inner.gen::<bool>() {
            1
        } else {
            -1
        }
    }
}

impl Default for PerformanceRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
