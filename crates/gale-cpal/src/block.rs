use smallvec::SmallVec;

use gale_core::{
    param::WindParamsSnapshot,
    rng::{Pcg32Source, RandomSource},
};
use gale_wind::WindSynth;

/// The most channels a [`BlockAdapter`] renders. Device channels past this
/// are filled with silence, so building the per-block channel list never
/// allocates.
pub const MAX_SYNTH_CHANNELS: usize = 8;

/// Drives a [`WindSynth`] with fixed-size blocks while serving device buffers
/// of any size.
///
/// Blocks are rendered into a planar scratch buffer and copied out frame by
/// frame. Frames that don't fit into the current device buffer are kept for
/// the next one, so the synth's control state always advances once per
/// `block_size` frames.
pub struct BlockAdapter<R: RandomSource = Pcg32Source> {
    synth: WindSynth<R>,
    scratch: Vec<f32>,
    frames_left: usize,
}

impl<R: RandomSource> BlockAdapter<R> {
    /// Wrap `synth`, re-preparing it with [`MAX_SYNTH_CHANNELS`] channels if
    /// it has more.
    pub fn new(mut synth: WindSynth<R>) -> Self {
        if synth.spec().channel_count() > MAX_SYNTH_CHANNELS {
            let capped = synth.spec().with_max_channels(MAX_SYNTH_CHANNELS);
            synth.prepare(capped);
        }
        let spec = *synth.spec();

        Self {
            synth,
            scratch: vec![0.0; spec.block_size() * spec.channel_count()],
            frames_left: 0,
        }
    }

    pub fn synth(&self) -> &WindSynth<R> {
        &self.synth
    }

    /// Fill an interleaved buffer with `num_out_channels` channels.
    ///
    /// `next_params` is called once before every new block, and `on_block`
    /// after it has been rendered. Output channels the synth wasn't prepared
    /// for are filled with silence.
    pub fn fill_interleaved(
        &mut self,
        output: &mut [f32],
        num_out_channels: usize,
        mut next_params: impl FnMut() -> WindParamsSnapshot,
        mut on_block: impl FnMut(&WindSynth<R>),
    ) {
        if num_out_channels == 0 {
            return;
        }

        let block_size = self.synth.spec().block_size();
        let num_synth_channels = self.synth.spec().channel_count();
        let num_frames = output.len() / num_out_channels;

        let mut frame = 0;
        while frame < num_frames {
            if self.frames_left == 0 {
                let params = next_params();
                self.render_block(&params);
                on_block(&self.synth);
                self.frames_left = block_size;
            }

            let start = block_size - self.frames_left;
            let frames = self.frames_left.min(num_frames - frame);

            let out_frames = output[frame * num_out_channels..(frame + frames) * num_out_channels]
                .chunks_exact_mut(num_out_channels);
            for (i, out_frame) in out_frames.enumerate() {
                for (ch, s) in out_frame.iter_mut().enumerate() {
                    *s = if ch < num_synth_channels {
                        self.scratch[ch * block_size + start + i]
                    } else {
                        0.0
                    };
                }
            }

            frame += frames;
            self.frames_left -= frames;
        }

        // Leftover samples that don't make a whole frame.
        output[num_frames * num_out_channels..].fill(0.0);
    }

    fn render_block(&mut self, params: &WindParamsSnapshot) {
        let block_size = self.synth.spec().block_size();

        self.scratch.fill(0.0);

        let mut channels: SmallVec<[&mut [f32]; MAX_SYNTH_CHANNELS]> =
            self.scratch.chunks_exact_mut(block_size).collect();
        self.synth.process_block(params, &mut channels);
    }
}
