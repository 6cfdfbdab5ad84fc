pub mod dsp;
pub mod param;
pub mod rng;

/// The configuration of the audio stream a synth is prepared for.
///
/// Control-rate state (ramps, gust episodes) is measured in whole blocks, so
/// the block size is part of the stream description and not just a buffer hint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessSpec {
    sample_rate: f64,
    block_size: usize,
    channel_count: usize,
}

impl ProcessSpec {
    pub fn new(
        sample_rate: f64,
        block_size: usize,
        channel_count: usize,
    ) -> Result<Self, ProcessSpecError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ProcessSpecError::InvalidSampleRate(sample_rate));
        }
        if block_size == 0 {
            return Err(ProcessSpecError::ZeroBlockSize);
        }
        if channel_count == 0 {
            return Err(ProcessSpecError::ZeroChannels);
        }

        Ok(Self {
            sample_rate,
            block_size,
            channel_count,
        })
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// The reciprocal of the sample rate.
    pub fn sample_rate_recip(&self) -> f64 {
        self.sample_rate.recip()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    /// The same stream with at most `max` channels (and never fewer than one).
    pub fn with_max_channels(mut self, max: usize) -> Self {
        self.channel_count = self.channel_count.min(max).max(1);
        self
    }

    /// The number of control updates (blocks) per second of audio.
    pub fn blocks_per_second(&self) -> f64 {
        self.sample_rate / self.block_size as f64
    }
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            block_size: 512,
            channel_count: 2,
        }
    }
}

/// An error returned when constructing an invalid [`ProcessSpec`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ProcessSpecError {
    #[error("Sample rate must be finite and greater than zero, got {0}")]
    InvalidSampleRate(f64),
    #[error("Block size must be at least one frame")]
    ZeroBlockSize,
    #[error("Channel count must be at least one")]
    ZeroChannels,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_specs() {
        assert_eq!(
            ProcessSpec::new(0.0, 512, 2),
            Err(ProcessSpecError::InvalidSampleRate(0.0))
        );
        assert!(matches!(
            ProcessSpec::new(f64::NAN, 512, 2),
            Err(ProcessSpecError::InvalidSampleRate(_))
        ));
        assert_eq!(
            ProcessSpec::new(48000.0, 0, 2),
            Err(ProcessSpecError::ZeroBlockSize)
        );
        assert_eq!(
            ProcessSpec::new(48000.0, 512, 0),
            Err(ProcessSpecError::ZeroChannels)
        );
    }

    #[test]
    fn blocks_per_second() {
        let spec = ProcessSpec::new(48000.0, 480, 2).unwrap();
        assert_eq!(spec.blocks_per_second(), 100.0);
    }

    #[test]
    fn max_channels_caps_without_dropping_to_zero() {
        let spec = ProcessSpec::new(48000.0, 480, 10).unwrap();
        assert_eq!(spec.with_max_channels(8).channel_count(), 8);
        assert_eq!(spec.with_max_channels(16).channel_count(), 10);
        assert_eq!(spec.with_max_channels(0).channel_count(), 1);
        assert_eq!(spec.with_max_channels(8).block_size(), 480);
    }
}
