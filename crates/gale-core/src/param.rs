//! Synth parameters shared between a control thread and the audio thread.
//!
//! The control thread writes into a [`WindParams`] behind an `Arc`, and the
//! audio thread takes one [`WindParamsSnapshot`] per block. Every field is a
//! separate lock-free atomic, so a snapshot is wait-free but may mix values
//! from two concurrent updates.

use core::ops::RangeInclusive;

use portable_atomic::{AtomicBool, AtomicF32, AtomicU32, Ordering};

/// The highest wind force level (a Beaufort-like scale).
pub const MAX_WIND_FORCE: u32 = 12;

pub const MASTER_GAIN_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const DISTANT_AMPLITUDE_RANGE: RangeInclusive<f32> = 0.0001..=1.5;
pub const UNIT_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// A plain copy of every parameter, taken once per block.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindParamsSnapshot {
    /// The gain applied to the whole block after rendering.
    ///
    /// By default this is set to `0.5`.
    pub master_gain: f32,
    /// The amplitude of the filtered noise voice.
    ///
    /// By default this is set to `0.75`.
    pub distant_amplitude: f32,
    /// The wind force level in the range `[0, 12]`.
    ///
    /// By default this is set to `3`.
    pub wind_force: u32,
    /// Whether gusts are generated on top of the base wind.
    ///
    /// By default this is set to `false`.
    pub gust_active: bool,
    /// How strong gusts are, in the range `[0.0, 1.0]`.
    ///
    /// By default this is set to `0.5`.
    pub gust_depth: f32,
    /// How far apart gusts are, in the range `[0.0, 1.0]`.
    ///
    /// By default this is set to `0.5`.
    pub gust_interval: f32,
    /// Whether gust episodes are drawn as squalls (longer and stronger).
    ///
    /// By default this is set to `false`.
    pub squall_active: bool,
    /// How strong squalls are, in the range `[0.0, 1.0]`.
    ///
    /// By default this is set to `0.5`.
    pub squall_depth: f32,
}

impl WindParamsSnapshot {
    /// Return a copy with every field clamped to its valid range.
    pub fn clamped(&self) -> Self {
        Self {
            master_gain: clamp_f32(self.master_gain, MASTER_GAIN_RANGE),
            distant_amplitude: clamp_f32(self.distant_amplitude, DISTANT_AMPLITUDE_RANGE),
            wind_force: self.wind_force.min(MAX_WIND_FORCE),
            gust_active: self.gust_active,
            gust_depth: clamp_f32(self.gust_depth, UNIT_RANGE),
            gust_interval: clamp_f32(self.gust_interval, UNIT_RANGE),
            squall_active: self.squall_active,
            squall_depth: clamp_f32(self.squall_depth, UNIT_RANGE),
        }
    }
}

impl Default for WindParamsSnapshot {
    fn default() -> Self {
        Self {
            master_gain: 0.5,
            distant_amplitude: 0.75,
            wind_force: 3,
            gust_active: false,
            gust_depth: 0.5,
            gust_interval: 0.5,
            squall_active: false,
            squall_depth: 0.5,
        }
    }
}

/// Lock-free parameter storage.
///
/// Setters clamp to the valid range, so the audio thread never sees an out of
/// range value.
#[derive(Debug)]
pub struct WindParams {
    master_gain: AtomicF32,
    distant_amplitude: AtomicF32,
    wind_force: AtomicU32,
    gust_active: AtomicBool,
    gust_depth: AtomicF32,
    gust_interval: AtomicF32,
    squall_active: AtomicBool,
    squall_depth: AtomicF32,
}

impl WindParams {
    pub fn new(initial: WindParamsSnapshot) -> Self {
        let initial = initial.clamped();

        Self {
            master_gain: AtomicF32::new(initial.master_gain),
            distant_amplitude: AtomicF32::new(initial.distant_amplitude),
            wind_force: AtomicU32::new(initial.wind_force),
            gust_active: AtomicBool::new(initial.gust_active),
            gust_depth: AtomicF32::new(initial.gust_depth),
            gust_interval: AtomicF32::new(initial.gust_interval),
            squall_active: AtomicBool::new(initial.squall_active),
            squall_depth: AtomicF32::new(initial.squall_depth),
        }
    }

    /// Read every parameter once.
    pub fn snapshot(&self) -> WindParamsSnapshot {
        WindParamsSnapshot {
            master_gain: self.master_gain.load(Ordering::Relaxed),
            distant_amplitude: self.distant_amplitude.load(Ordering::Relaxed),
            wind_force: self.wind_force.load(Ordering::Relaxed),
            gust_active: self.gust_active.load(Ordering::Relaxed),
            gust_depth: self.gust_depth.load(Ordering::Relaxed),
            gust_interval: self.gust_interval.load(Ordering::Relaxed),
            squall_active: self.squall_active.load(Ordering::Relaxed),
            squall_depth: self.squall_depth.load(Ordering::Relaxed),
        }
    }

    /// Overwrite every parameter.
    pub fn store(&self, params: &WindParamsSnapshot) {
        let params = params.clamped();

        self.master_gain.store(params.master_gain, Ordering::Relaxed);
        self.distant_amplitude.store(params.distant_amplitude, Ordering::Relaxed);
        self.wind_force.store(params.wind_force, Ordering::Relaxed);
        self.gust_active.store(params.gust_active, Ordering::Relaxed);
        self.gust_depth.store(params.gust_depth, Ordering::Relaxed);
        self.gust_interval.store(params.gust_interval, Ordering::Relaxed);
        self.squall_active.store(params.squall_active, Ordering::Relaxed);
        self.squall_depth.store(params.squall_depth, Ordering::Relaxed);
    }

    pub fn set_master_gain(&self, gain: f32) {
        self.master_gain.store(clamp_f32(gain, MASTER_GAIN_RANGE), Ordering::Relaxed);
    }

    pub fn set_distant_amplitude(&self, amplitude: f32) {
        self.distant_amplitude
            .store(clamp_f32(amplitude, DISTANT_AMPLITUDE_RANGE), Ordering::Relaxed);
    }

    pub fn set_wind_force(&self, force: u32) {
        self.wind_force.store(force.min(MAX_WIND_FORCE), Ordering::Relaxed);
    }

    pub fn set_gust_active(&self, active: bool) {
        self.gust_active.store(active, Ordering::Relaxed);
    }

    pub fn set_gust_depth(&self, depth: f32) {
        self.gust_depth.store(clamp_f32(depth, UNIT_RANGE), Ordering::Relaxed);
    }

    pub fn set_gust_interval(&self, interval: f32) {
        self.gust_interval.store(clamp_f32(interval, UNIT_RANGE), Ordering::Relaxed);
    }

    pub fn set_squall_active(&self, active: bool) {
        self.squall_active.store(active, Ordering::Relaxed);
    }

    pub fn set_squall_depth(&self, depth: f32) {
        self.squall_depth.store(clamp_f32(depth, UNIT_RANGE), Ordering::Relaxed);
    }
}

impl Default for WindParams {
    fn default() -> Self {
        Self::new(WindParamsSnapshot::default())
    }
}

// NaN maps to the bottom of the range.
fn clamp_f32(value: f32, range: RangeInclusive<f32>) -> f32 {
    if value.is_nan() {
        *range.start()
    } else {
        value.clamp(*range.start(), *range.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_atomics() {
        let params = WindParams::default();
        assert_eq!(params.snapshot(), WindParamsSnapshot::default());
    }

    #[test]
    fn setters_clamp() {
        let params = WindParams::default();

        params.set_master_gain(3.0);
        params.set_distant_amplitude(0.0);
        params.set_wind_force(40);
        params.set_gust_depth(-1.0);
        params.set_gust_interval(f32::NAN);
        params.set_squall_depth(1.5);

        let s = params.snapshot();
        assert_eq!(s.master_gain, 1.0);
        assert_eq!(s.distant_amplitude, 0.0001);
        assert_eq!(s.wind_force, MAX_WIND_FORCE);
        assert_eq!(s.gust_depth, 0.0);
        assert_eq!(s.gust_interval, 0.0);
        assert_eq!(s.squall_depth, 1.0);
    }

    #[test]
    fn store_overwrites_everything() {
        let params = WindParams::default();
        let new = WindParamsSnapshot {
            master_gain: 0.25,
            distant_amplitude: 1.0,
            wind_force: 9,
            gust_active: true,
            gust_depth: 0.1,
            gust_interval: 0.9,
            squall_active: true,
            squall_depth: 0.7,
        };

        params.store(&new);
        assert_eq!(params.snapshot(), new);
    }
}
