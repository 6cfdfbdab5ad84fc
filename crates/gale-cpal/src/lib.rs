//! Plays a [`WindSynth`] through the default (or a named) cpal output device.

mod block;

use std::{fmt::Debug, sync::Arc, time::Duration};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use gale_core::{
    param::{WindParams, WindParamsSnapshot},
    ProcessSpec, ProcessSpecError,
};
use gale_wind::{WindSynth, WindSynthConfig, WindTelemetry};
use ringbuf::traits::{Consumer, Producer, Split};

pub use block::{BlockAdapter, MAX_SYNTH_CHANNELS};

/// 512 frames is about 11 milliseconds of control resolution at 44.1kHz.
const DEFAULT_BLOCK_FRAMES: u32 = 512;
/// 1024 frames is a latency of about 23 milliseconds.
const DEFAULT_LATENCY_FRAMES: u32 = 1024;
const BUILD_STREAM_TIMEOUT: Duration = Duration::from_secs(5);
const ERR_CHANNEL_CAPACITY: usize = 4;

/// Information about an audio output device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub num_channels: u16,
    pub is_default: bool,
}

/// The configuration of an audio stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioStreamConfig {
    /// The name of the output device to use. Set to `None` to use the
    /// system's default output device.
    ///
    /// By default this is set to `None`.
    pub output_device_name: Option<String>,

    /// The desired sample rate to use. Set to `None` to use the device's
    /// default sample rate.
    ///
    /// By default this is set to `None`.
    pub desired_sample_rate: Option<u32>,

    /// The number of frames in one synth block. The wind and gust state
    /// advance once per block.
    ///
    /// By default this is set to `512`.
    pub block_frames: u32,

    /// The latency of the audio stream to use.
    ///
    /// Smaller values may give better latency, but is not supported on
    /// all platforms and may lead to performance issues.
    ///
    /// By default this is set to `1024`.
    pub desired_latency_frames: u32,

    /// Whether or not to fall back to the default device if a device with
    /// the given name could not be found.
    ///
    /// By default this is set to `true`.
    pub fallback: bool,
}

impl Default for AudioStreamConfig {
    fn default() -> Self {
        Self {
            output_device_name: None,
            desired_sample_rate: None,
            block_frames: DEFAULT_BLOCK_FRAMES,
            desired_latency_frames: DEFAULT_LATENCY_FRAMES,
            fallback: true,
        }
    }
}

/// The result of [`GaleCpalCtx::update`]
#[derive(Debug)]
pub enum UpdateStatus {
    Inactive,
    Active,
    /// The stream stopped because of an error and the context was
    /// deactivated.
    Deactivated { error: cpal::StreamError },
}

struct ActiveState {
    _stream: cpal::Stream,
    from_err_rx: ringbuf::HeapCons<cpal::StreamError>,
    telemetry_rx: triple_buffer::Output<WindTelemetry>,
    out_device_name: String,
    cpal_config: cpal::StreamConfig,
    spec: ProcessSpec,
}

/// A wind synth playing on a cpal output stream.
///
/// Parameters can be changed at any time through [`GaleCpalCtx::params`],
/// from any thread.
pub struct GaleCpalCtx {
    params: Arc<WindParams>,
    active_state: Option<ActiveState>,
}

impl GaleCpalCtx {
    pub fn new(initial_params: WindParamsSnapshot) -> Self {
        Self {
            params: Arc::new(WindParams::new(initial_params)),
            active_state: None,
        }
    }

    /// The shared parameters read by the audio thread once per block.
    pub fn params(&self) -> &Arc<WindParams> {
        &self.params
    }

    /// Returns whether or not this context is currently activated.
    pub fn is_activated(&self) -> bool {
        self.active_state.is_some()
    }

    pub fn available_output_devices(&self) -> Vec<DeviceInfo> {
        let mut devices = Vec::with_capacity(16);

        let host = cpal::default_host();

        let default_device_name = if let Some(default_device) = host.default_output_device() {
            match default_device.name() {
                Ok(n) => Some(n),
                Err(e) => {
                    log::warn!("Failed to get name of default audio output device: {}", e);
                    None
                }
            }
        } else {
            None
        };

        match host.output_devices() {
            Ok(output_devices) => {
                for device in output_devices {
                    let Ok(name) = device.name() else {
                        continue;
                    };

                    let is_default = default_device_name.as_ref() == Some(&name);

                    let default_out_config = match device.default_output_config() {
                        Ok(c) => c,
                        Err(e) => {
                            if is_default {
                                log::warn!("Failed to get default config for the default audio output device: {}", e);
                            }
                            continue;
                        }
                    };

                    devices.push(DeviceInfo {
                        name,
                        num_channels: default_out_config.channels(),
                        is_default,
                    })
                }
            }
            Err(e) => {
                log::error!("Failed to get output audio devices: {}", e);
            }
        }

        devices
    }

    /// Start the audio stream with a new synth.
    ///
    /// Returns an error if the context is already active.
    pub fn activate(
        &mut self,
        config: AudioStreamConfig,
        synth_config: WindSynthConfig,
    ) -> Result<(), ActivateError> {
        if self.is_activated() {
            return Err(ActivateError::AlreadyActivated);
        }

        let host = cpal::default_host();
        let device = find_output_device(&host, &config)?;

        let default_cpal_config = device.default_output_config()?;

        let mut desired_sample_rate = config
            .desired_sample_rate
            .unwrap_or(default_cpal_config.sample_rate().0);

        let mut min_sample_rate = u32::MAX;
        let mut max_sample_rate = 0;
        for supported in device.supported_output_configs()? {
            min_sample_rate = min_sample_rate.min(supported.min_sample_rate().0);
            max_sample_rate = max_sample_rate.max(supported.max_sample_rate().0);
        }
        if min_sample_rate <= max_sample_rate {
            desired_sample_rate = desired_sample_rate.clamp(min_sample_rate, max_sample_rate);
        }

        let buffer_size = if let &cpal::SupportedBufferSize::Range { min, max } =
            default_cpal_config.buffer_size()
        {
            cpal::BufferSize::Fixed(config.desired_latency_frames.clamp(min, max))
        } else {
            cpal::BufferSize::Default
        };

        let num_out_channels = default_cpal_config.channels() as usize;

        let cpal_config = cpal::StreamConfig {
            channels: num_out_channels as u16,
            sample_rate: cpal::SampleRate(desired_sample_rate),
            buffer_size,
        };

        // Device channels past the synth's channel count play silence.
        let spec = ProcessSpec::new(
            f64::from(desired_sample_rate),
            config.block_frames as usize,
            num_out_channels.min(MAX_SYNTH_CHANNELS),
        )?;

        let out_device_name = device.name().unwrap_or_else(|_| "unknown".into());

        log::info!(
            "Starting output audio stream with device \"{}\" with configuration {:?}",
            &out_device_name,
            &cpal_config
        );

        let (mut err_to_cx_tx, from_err_rx) =
            ringbuf::HeapRb::<cpal::StreamError>::new(ERR_CHANNEL_CAPACITY).split();
        let (mut telemetry_tx, telemetry_rx) =
            triple_buffer::triple_buffer(&WindTelemetry::default());

        let mut adapter = BlockAdapter::new(WindSynth::new(spec, synth_config));
        let params = Arc::clone(&self.params);

        let stream = device.build_output_stream(
            &cpal_config,
            move |output: &mut [f32], _: &cpal::OutputCallbackInfo| {
                adapter.fill_interleaved(
                    output,
                    num_out_channels,
                    || params.snapshot(),
                    |synth| telemetry_tx.write(synth.telemetry()),
                );
            },
            move |err| {
                let _ = err_to_cx_tx.try_push(err);
            },
            Some(BUILD_STREAM_TIMEOUT),
        )?;

        stream.play()?;

        self.active_state = Some(ActiveState {
            _stream: stream,
            from_err_rx,
            telemetry_rx,
            out_device_name,
            cpal_config,
            spec,
        });

        Ok(())
    }

    /// Get the name of the audio output device.
    ///
    /// Returns `None` if the context is not currently activated.
    pub fn out_device_name(&self) -> Option<&str> {
        self.active_state
            .as_ref()
            .map(|s| s.out_device_name.as_str())
    }

    /// Get the current configuration of the audio stream.
    ///
    /// Returns `None` if the context is not currently activated.
    pub fn stream_config(&self) -> Option<&cpal::StreamConfig> {
        self.active_state.as_ref().map(|s| &s.cpal_config)
    }

    /// The process description the synth was prepared with.
    ///
    /// Returns `None` if the context is not currently activated.
    pub fn process_spec(&self) -> Option<&ProcessSpec> {
        self.active_state.as_ref().map(|s| &s.spec)
    }

    /// The synth state after the most recently rendered block.
    ///
    /// Returns `None` if the context is not currently activated.
    pub fn telemetry(&mut self) -> Option<WindTelemetry> {
        self.active_state
            .as_mut()
            .map(|s| *s.telemetry_rx.read())
    }

    /// Poll the stream for errors.
    ///
    /// This should be called reguarly once the context has been activated
    /// (i.e. once every frame).
    pub fn update(&mut self) -> UpdateStatus {
        let Some(state) = &mut self.active_state else {
            return UpdateStatus::Inactive;
        };

        if let Some(error) = state.from_err_rx.try_pop() {
            log::error!("Audio stream stopped: {}", error);
            self.active_state = None;
            return UpdateStatus::Deactivated { error };
        }

        UpdateStatus::Active
    }

    /// Stop the audio stream.
    ///
    /// Does nothing if the context is not activated.
    pub fn deactivate(&mut self) {
        if self.active_state.take().is_some() {
            log::info!("Stopped output audio stream");
        }
    }
}

impl Default for GaleCpalCtx {
    fn default() -> Self {
        Self::new(WindParamsSnapshot::default())
    }
}

// Implement Debug so `unwrap()` can be used.
impl Debug for GaleCpalCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GaleCpalCtx")
    }
}

fn find_output_device(
    host: &cpal::Host,
    config: &AudioStreamConfig,
) -> Result<cpal::Device, ActivateError> {
    if let Some(output_device_name) = &config.output_device_name {
        match host.output_devices() {
            Ok(mut output_devices) => {
                if let Some(d) = output_devices.find(|d| {
                    d.name()
                        .map(|name| &name == output_device_name)
                        .unwrap_or(false)
                }) {
                    return Ok(d);
                } else if config.fallback {
                    log::warn!("Could not find requested audio output device: {}. Falling back to default device...", &output_device_name);
                } else {
                    return Err(ActivateError::DeviceNotFound(output_device_name.clone()));
                }
            }
            Err(e) => {
                if config.fallback {
                    log::error!(
                        "Failed to get output audio devices: {}. Falling back to default device...",
                        e
                    );
                } else {
                    return Err(e.into());
                }
            }
        }
    }

    host.default_output_device()
        .ok_or(ActivateError::DefaultDeviceNotFound)
}

/// An error occured while trying to activate a [`GaleCpalCtx`]
#[derive(Debug, thiserror::Error)]
pub enum ActivateError {
    #[error("The audio stream is already active")]
    AlreadyActivated,
    #[error("The requested audio device was not found: {0}")]
    DeviceNotFound(String),
    #[error("Could not get audio devices: {0}")]
    FailedToGetDevices(#[from] cpal::DevicesError),
    #[error("Failed to get default audio output device")]
    DefaultDeviceNotFound,
    #[error("Failed to get audio device configs: {0}")]
    FailedToGetConfigs(#[from] cpal::SupportedStreamConfigsError),
    #[error("Failed to get audio device config: {0}")]
    FailedToGetConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("Invalid stream configuration: {0}")]
    InvalidSpec(#[from] ProcessSpecError),
    #[error("Failed to build audio stream: {0}")]
    BuildStreamError(#[from] cpal::BuildStreamError),
    #[error("Failed to play audio stream: {0}")]
    PlayStreamError(#[from] cpal::PlayStreamError),
}
