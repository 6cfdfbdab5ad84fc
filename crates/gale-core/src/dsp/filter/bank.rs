use smallvec::SmallVec;

use super::filter_trait::Filter;

/// A collection of per-channel filters `F` that share coefficients.
///
/// Each channel keeps its own memory, so feeding every channel independent
/// noise keeps the channels decorrelated.
#[derive(Debug, Clone)]
pub struct FilterBank<F: Filter> {
    filters: SmallVec<[F; 2]>,
    pub coeffs: F::Coeffs,
}

impl<F> FilterBank<F>
where
    F: Filter + Default + Clone,
{
    pub fn new(num_channels: usize, coeffs: F::Coeffs) -> Self {
        Self {
            filters: smallvec::smallvec![F::default(); num_channels],
            coeffs,
        }
    }

    /// Resize the bank and reset the memory of every channel.
    pub fn prepare(&mut self, num_channels: usize) {
        self.filters.clear();
        self.filters.resize(num_channels, F::default());
    }
}

impl<F: Filter> FilterBank<F> {
    pub fn num_channels(&self) -> usize {
        self.filters.len()
    }

    pub fn reset(&mut self) {
        for filter in self.filters.iter_mut() {
            filter.reset();
        }
    }

    /// Process one sample through the filter of `channel_index`.
    ///
    /// # Panics
    ///
    /// Panics if `channel_index` is out of range.
    #[inline(always)]
    pub fn process(&mut self, channel_index: usize, x: f32) -> f32 {
        self.filters[channel_index].process(x, &self.coeffs)
    }

    /// The filter memory of `channel_index`, if that channel exists.
    pub fn channel(&self, channel_index: usize) -> Option<&F> {
        self.filters.get(channel_index)
    }

    pub fn is_silent(&self) -> bool {
        self.filters.iter().all(|filter| filter.is_silent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::filter::svf::{SvfCoeff, SvfState};

    #[test]
    fn channels_keep_separate_state() {
        let coeffs = SvfCoeff::bandpass(200.0, 1.0, 48000.0f32.recip());
        let mut bank = FilterBank::<SvfState>::new(2, coeffs);

        for _ in 0..32 {
            bank.process(0, 1.0);
        }

        assert!(!bank.channel(0).unwrap().is_silent());
        assert!(bank.channel(1).unwrap().is_silent());
        assert!(!bank.is_silent());
    }

    #[test]
    fn prepare_resizes_and_clears() {
        let mut bank = FilterBank::<SvfState>::new(1, SvfCoeff::NO_OP);
        bank.coeffs = SvfCoeff::bandpass(200.0, 1.0, 48000.0f32.recip());
        bank.process(0, 1.0);

        bank.prepare(3);

        assert_eq!(bank.num_channels(), 3);
        assert!(bank.is_silent());
    }
}
