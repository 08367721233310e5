//! Voss-McCartney pink (1/f) noise
//!
//! A `bits`-wide counter drives `bits` stored white-noise values. Each call
//! advances the counter and resamples exactly the sub-generators whose
//! counter bit flipped, so bit 0 changes every call, bit 1 every second call,
//! and so on. The mean of the stored values is a bounded, long-range
//! correlated fluctuation.

use super::rng::PerformanceRng;
use crate::config::PinkNoiseParams;

pub struct PinkNoise {
    bits: u32,
    mask: u32,
    counter: u32,
    range: f64,
    values: Vec<f64>,
    last_resampled: u32,
}

impl PinkNoise {
    pub fn new(params: &PinkNoiseParams) -> Self {
        // At least one sub-generator, and the counter must fit in a u32
        let bits = params.bits.clamp(1, 31);
        Self {
            bits,
            mask: (1u32 << bits) - 1,
            counter: 0,
            range: params.range.abs(),
            values: vec![0.0; bits as usize],
            last_resampled: 0,
        }
    }

    /// Next value, always within [-range, range]
    pub fn next(&mut self, rng: &mut PerformanceRng) -> f64 {
        let previous = self.counter;
        self.counter = (self.counter + 1) & self.mask;
        let changed = previous ^ self.counter;

        for bit in 0..self.bits {
            if changed & (1 << bit) != 0 {
                self.values[bit as usize] = rng.symmetric(self.range);
            }
        }
        self.last_resampled = changed;

        let sum: f64 = self.values.iter().sum();
        (sum / self.bits as f64).clamp(-self.range, self.range)
    }

    /// Bit mask of the sub-generators resampled by the latest `next()`
    pub fn last_resampled(&self) -> u32 {
        self.last_resampled
    }
}
