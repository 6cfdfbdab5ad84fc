use gale_core::{
    dsp::{
        filter::{
            bank::FilterBank,
            svf::{SvfCoeff, SvfState},
        },
        noise::WhiteNoise,
    },
    param::WindParamsSnapshot,
    rng::{Pcg32Source, RandomSource},
    ProcessSpec,
};

use crate::{
    gust::{EpisodeKind, GustStatus},
    BlockRate, WindControl,
};

/// Wind energy is scaled by this factor to get the cutoff frequency in Hz.
pub const CUTOFF_PER_ENERGY: f32 = 30.0;
pub const MIN_CUTOFF_HZ: f32 = 0.004;
pub const MAX_CUTOFF_HZ: f32 = 1500.0;

/// The cutoff is also kept below this fraction of the sample rate.
const MAX_CUTOFF_NYQUIST_RATIO: f32 = 0.49;

const INITIAL_CUTOFF_HZ: f32 = 10.0;
const INITIAL_RESONANCE: f32 = 1.0;

/// The configuration for a [`WindSynth`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindSynthConfig {
    /// The seed for the random source. Set to `None` to seed from the
    /// system clock.
    ///
    /// By default this is set to `None`.
    pub seed: Option<u64>,
}

/// A read-only view of the synth's control state after a block.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindTelemetry {
    pub wind_speed: f32,
    pub gust_level: f32,
    pub gust_status: GustStatus,
    pub episode_kind: EpisodeKind,
    pub cutoff_hz: f32,
    pub resonance: f32,
}

/// Renders wind as white noise through a band-pass filter whose cutoff and
/// resonance follow the wind speed and gusts.
///
/// All methods must be called from the audio thread. Parameters are passed
/// in as a snapshot for every block.
#[derive(Debug, Clone)]
pub struct WindSynth<R: RandomSource = Pcg32Source> {
    spec: ProcessSpec,
    rate: BlockRate,
    control: WindControl,
    filter: FilterBank<SvfState>,
    noise: WhiteNoise,
    rng: R,
    cutoff_hz: f32,
    resonance: f32,
}

impl WindSynth<Pcg32Source> {
    pub fn new(spec: ProcessSpec, config: WindSynthConfig) -> Self {
        Self::with_source(spec, Pcg32Source::from_seed_or_time(config.seed))
    }
}

impl<R: RandomSource> WindSynth<R> {
    /// Create a synth that draws every random value from `rng`.
    pub fn with_source(spec: ProcessSpec, mut rng: R) -> Self {
        let noise = WhiteNoise::from_source(&mut rng);

        let mut synth = Self {
            spec,
            rate: BlockRate::new(&spec),
            control: WindControl::default(),
            filter: FilterBank::new(spec.channel_count(), SvfCoeff::NO_OP),
            noise,
            rng,
            cutoff_hz: INITIAL_CUTOFF_HZ,
            resonance: INITIAL_RESONANCE,
        };
        synth.prepare(spec);
        synth
    }

    /// Reset the filter memory and all control state for a (possibly new)
    /// stream configuration.
    ///
    /// This allocates if the channel count grows, so don't call it for every
    /// block.
    pub fn prepare(&mut self, spec: ProcessSpec) {
        log::debug!(
            "Preparing wind synth: {} Hz, {} frames per block, {} channels",
            spec.sample_rate(),
            spec.block_size(),
            spec.channel_count()
        );

        self.spec = spec;
        self.rate = BlockRate::new(&spec);
        self.control.reset();
        self.filter.prepare(spec.channel_count());
        self.set_filter(INITIAL_CUTOFF_HZ, INITIAL_RESONANCE);
    }

    /// Render one block, adding into `outputs`.
    ///
    /// `outputs` holds one slice per channel and is expected to be cleared by
    /// the caller. Channels past [`ProcessSpec::channel_count`] are left
    /// untouched. The control state advances once per call regardless of the
    /// slice lengths.
    pub fn process_block(&mut self, params: &WindParamsSnapshot, outputs: &mut [&mut [f32]]) {
        let params = params.clamped();

        self.advance_control(&params);
        self.update_coefficients();
        self.render_block(params.distant_amplitude, outputs);

        for out_ch in outputs.iter_mut() {
            for s in out_ch.iter_mut() {
                *s *= params.master_gain;
            }
        }
    }

    /// Advance the wind speed ramp and gust machine by one block.
    ///
    /// `params` is clamped to the parameter ranges first.
    pub fn advance_control(&mut self, params: &WindParamsSnapshot) {
        self.control.advance(&params.clamped(), self.rate, &mut self.rng);
    }

    /// Derive the filter cutoff and resonance from the current wind energy.
    pub fn update_coefficients(&mut self) {
        let energy = self.control.energy();

        // Very low sample rates put the Nyquist ceiling under the floor.
        let max_cutoff_hz = MAX_CUTOFF_HZ
            .min(self.spec.sample_rate() as f32 * MAX_CUTOFF_NYQUIST_RATIO)
            .max(MIN_CUTOFF_HZ);
        let cutoff_hz = (energy * CUTOFF_PER_ENERGY).clamp(MIN_CUTOFF_HZ, max_cutoff_hz);
        let resonance = 1.0 + (energy * 0.1).max(1.0).ln();

        self.set_filter(cutoff_hz, resonance);
    }

    /// Add one block of filtered noise scaled by `amplitude` into `outputs`.
    pub fn render_block(&mut self, amplitude: f32, outputs: &mut [&mut [f32]]) {
        let num_channels = self.filter.num_channels();

        for (ch, out_ch) in outputs.iter_mut().take(num_channels).enumerate() {
            for s in out_ch.iter_mut() {
                let x = self.noise.next_sample();
                *s += self.filter.process(ch, x) * amplitude;
            }
        }
    }

    fn set_filter(&mut self, cutoff_hz: f32, resonance: f32) {
        self.cutoff_hz = cutoff_hz;
        self.resonance = resonance;
        self.filter.coeffs = SvfCoeff::bandpass(
            cutoff_hz,
            resonance,
            self.spec.sample_rate_recip() as f32,
        );
    }

    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    pub fn control(&self) -> &WindControl {
        &self.control
    }

    pub fn filter(&self) -> &FilterBank<SvfState> {
        &self.filter
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    pub fn resonance(&self) -> f32 {
        self.resonance
    }

    pub fn telemetry(&self) -> WindTelemetry {
        WindTelemetry {
            wind_speed: self.control.wind.current(),
            gust_level: self.control.gust.current(),
            gust_status: self.control.gust.status(),
            episode_kind: self.control.gust.kind(),
            cutoff_hz: self.cutoff_hz,
            resonance: self.resonance,
        }
    }
}
