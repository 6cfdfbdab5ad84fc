//! A cheap white noise generator for the per-sample loop.

use crate::rng::RandomSource;

const DEFAULT_SEED: u32 = 17;

/// A xorshift32 white noise generator producing uniform samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhiteNoise {
    fpd: u32,
}

impl WhiteNoise {
    /// Create a new generator. A seed of zero is replaced with a default
    /// seed since xorshift gets stuck at zero.
    pub fn new(seed: u32) -> Self {
        Self {
            fpd: if seed == 0 { DEFAULT_SEED } else { seed },
        }
    }

    /// Create a new generator seeded from a [`RandomSource`].
    pub fn from_source<R: RandomSource>(source: &mut R) -> Self {
        let hi = (source.uniform() * 65_536.0) as u32;
        let lo = (source.uniform() * 65_536.0) as u32;
        Self::new((hi << 16) | (lo & 0xFFFF))
    }

    #[inline(always)]
    pub fn next_sample(&mut self) -> f32 {
        self.fpd ^= self.fpd << 13;
        self.fpd ^= self.fpd >> 17;
        self.fpd ^= self.fpd << 5;

        self.fpd as f32 * (2.0 / 4_294_967_295.0) - 1.0
    }
}

impl Default for WhiteNoise {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}
