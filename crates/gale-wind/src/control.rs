use gale_core::{param::WindParamsSnapshot, rng::RandomSource, ProcessSpec};

use crate::{gust::GustState, wind_speed::WindSpeed};

/// Converts durations in seconds into whole control blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockRate {
    blocks_per_second: f32,
}

impl BlockRate {
    pub fn new(spec: &ProcessSpec) -> Self {
        Self {
            blocks_per_second: spec.blocks_per_second() as f32,
        }
    }

    pub fn blocks_per_second(&self) -> f32 {
        self.blocks_per_second
    }

    /// The number of blocks closest to `seconds`, never less than one.
    ///
    /// Negative and NaN durations also map to one block.
    #[inline]
    pub fn blocks(&self, seconds: f32) -> u32 {
        let blocks = (seconds * self.blocks_per_second).round();
        if blocks >= 1.0 {
            blocks as u32
        } else {
            1
        }
    }
}

/// All block-rate state of the synth, advanced once per block.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct WindControl {
    pub wind: WindSpeed,
    pub gust: GustState,
}

impl WindControl {
    pub fn reset(&mut self) {
        self.wind.reset();
        self.gust.reset();
    }

    /// Advance the wind speed ramp and then the gust machine by one block.
    ///
    /// `params` should already be clamped to the parameter ranges.
    pub fn advance<R: RandomSource>(
        &mut self,
        params: &WindParamsSnapshot,
        rate: BlockRate,
        rng: &mut R,
    ) {
        self.wind.advance(params.wind_force, rate, rng);
        self.gust.advance(params, rate, rng);
    }

    /// The wind energy driving the filter. Clamps the stored wind speed at
    /// zero before use.
    pub fn energy(&mut self) -> f32 {
        self.wind.clamp_current() + self.gust.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_round_and_floor_at_one() {
        let rate = BlockRate::new(&ProcessSpec::new(48000.0, 480, 2).unwrap());

        assert_eq!(rate.blocks(1.0), 100);
        assert_eq!(rate.blocks(0.004), 1);
        assert_eq!(rate.blocks(0.016), 2);
        assert_eq!(rate.blocks(0.0), 1);
        assert_eq!(rate.blocks(-3.0), 1);
        assert_eq!(rate.blocks(f32::NAN), 1);
    }

    #[test]
    fn huge_blocks_still_count_one() {
        let rate = BlockRate::new(&ProcessSpec::new(8000.0, 1 << 20, 1).unwrap());
        assert_eq!(rate.blocks(5.0), 1);
    }
}
