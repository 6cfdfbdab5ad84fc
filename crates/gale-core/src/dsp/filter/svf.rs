//! Topology-preserving (trapezoidal) state variable filter.
//!
//! Based on <https://github.com/MeadowlarkDAW/meadow-dsp/tree/main/meadow-dsp-mit>
use std::f32::consts::PI;

use super::filter_trait::Filter;

/// The coefficients for an SVF (state variable filter) model.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct SvfCoeff {
    pub a1: f32,
    pub a2: f32,
    pub a3: f32,

    pub m0: f32,
    pub m1: f32,
    pub m2: f32,
}

impl SvfCoeff {
    pub const NO_OP: Self = Self {
        a1: 0.0,
        a2: 0.0,
        a3: 0.0,
        m0: 1.0,
        m1: 0.0,
        m2: 0.0,
    };

    /// A band-pass response. The gain at `cutoff_hz` is `q`.
    pub fn bandpass(cutoff_hz: f32, q: f32, sample_rate_recip: f32) -> Self {
        let g = g(cutoff_hz, sample_rate_recip);
        let k = 1. / q;

        Self::from_g_and_k(g, k, 0., 1., 0.)
    }

    pub fn from_g_and_k(g: f32, k: f32, m0: f32, m1: f32, m2: f32) -> Self {
        let a1 = 1.0 / (1.0 + g * (g + k));
        let a2 = g * a1;
        let a3 = g * a2;

        Self {
            a1,
            a2,
            a3,
            m0,
            m1,
            m2,
        }
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct SvfState {
    pub ic1eq: f32,
    pub ic2eq: f32,
}

impl Filter for SvfState {
    type Coeffs = SvfCoeff;

    #[inline(always)]
    fn process(&mut self, input: f32, coeff: &Self::Coeffs) -> f32 {
        let v3 = input - self.ic2eq;
        let v1 = coeff.a1 * self.ic1eq + coeff.a2 * v3;
        let v2 = self.ic2eq + coeff.a2 * self.ic1eq + coeff.a3 * v3;
        self.ic1eq = 2.0 * v1 - self.ic1eq;
        self.ic2eq = 2.0 * v2 - self.ic2eq;

        coeff.m0 * input + coeff.m1 * v1 + coeff.m2 * v2
    }

    #[inline(always)]
    fn reset(&mut self) {
        self.ic1eq = 0.0;
        self.ic2eq = 0.0;
    }

    #[inline(always)]
    fn is_silent(&self) -> bool {
        self.ic1eq.abs() <= Self::SILENT_THRESHOLD && self.ic2eq.abs() <= Self::SILENT_THRESHOLD
    }
}

fn g(cutoff_hz: f32, sample_rate_recip: f32) -> f32 {
    (PI * cutoff_hz * sample_rate_recip).tan()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48000.0;

    fn sine_peak(coeff: &SvfCoeff, freq_hz: f32) -> f32 {
        let mut state = SvfState::default();
        let mut peak = 0.0f32;
        let n = SAMPLE_RATE as usize;

        for i in 0..n {
            let x = (2.0 * PI * freq_hz * i as f32 / SAMPLE_RATE).sin();
            let y = state.process(x, coeff);

            // Skip the transient.
            if i > n / 2 {
                peak = peak.max(y.abs());
            }
        }

        peak
    }

    #[test]
    fn bandpass_passes_center() {
        let coeff = SvfCoeff::bandpass(1000.0, 1.0, SAMPLE_RATE.recip());

        let center = sine_peak(&coeff, 1000.0);
        let far_low = sine_peak(&coeff, 50.0);
        let far_high = sine_peak(&coeff, 15000.0);

        assert!((center - 1.0).abs() < 0.02, "center = {}", center);
        assert!(far_low < 0.1, "far_low = {}", far_low);
        assert!(far_high < 0.1, "far_high = {}", far_high);
    }

    #[test]
    fn bandpass_gain_follows_q() {
        let coeff = SvfCoeff::bandpass(1000.0, 3.0, SAMPLE_RATE.recip());
        let center = sine_peak(&coeff, 1000.0);
        assert!((center - 3.0).abs() < 0.06, "center = {}", center);
    }

    #[test]
    fn reset_clears_state() {
        let coeff = SvfCoeff::bandpass(500.0, 1.0, SAMPLE_RATE.recip());
        let mut state = SvfState::default();
        for _ in 0..64 {
            state.process(1.0, &coeff);
        }
        assert!(!state.is_silent());

        state.reset();
        assert!(state.is_silent());
        assert_eq!(state, SvfState::default());
    }
}
