//! Stochastic wind synthesis.
//!
//! A [`WindSynth`] advances its control state once per block:
//!
//! 1. the [`wind_speed::WindSpeed`] ramp steps toward a randomly drawn target,
//! 2. the [`gust::GustState`] machine adds or removes a transient gust,
//! 3. the sum sets the cutoff and resonance of a band-pass filter,
//!
//! and then renders the block by driving white noise through that filter.

mod control;

pub mod gust;
pub mod synth;
pub mod wind_speed;

pub use control::{BlockRate, WindControl};
pub use synth::{WindSynth, WindSynthConfig, WindTelemetry};
