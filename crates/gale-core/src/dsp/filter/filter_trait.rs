use core::fmt::Debug;

pub trait Filter {
    /// The type of coefficients needed for the filter to process samples.
    type Coeffs: Clone + Debug;

    /// Internal state at or below this magnitude counts as silent.
    const SILENT_THRESHOLD: f32 = 1e-9;

    /// Resets the filter memory.
    fn reset(&mut self);

    /// Processes a single sample.
    fn process(&mut self, input: f32, coeffs: &Self::Coeffs) -> f32;

    /// Whether all of the filter memory is within [`Filter::SILENT_THRESHOLD`].
    fn is_silent(&self) -> bool;
}
