use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::audio::parameters::SynthParameters;
use crate::audio::synthesiser::Synthesiser;
use crate::midi::buffer::MidiBuffer;
use crate::midi::collector::{CollectorStats, MidiCollector};

/// Counters readable from the render side without touching the control side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub collector: CollectorStats,
    /// Note-ons that found every voice busy
    pub dropped_note_ons: u64,
    pub active_voices: usize,
}

/// Render-context half of the bridge. Owns the synthesiser and the consumer
/// end of the event queue; `render_block` never blocks, logs or allocates.
pub struct RenderDriver {
    synth: Synthesiser,
    collector: MidiCollector,
    block_events: MidiBuffer,
    params: Arc<SynthParameters>,
    initialised: Arc<AtomicBool>,
}

impl RenderDriver {
    pub(crate) fn new(
        synth: Synthesiser,
        collector: MidiCollector,
        event_capacity: usize,
        params: Arc<SynthParameters>,
        initialised: Arc<AtomicBool>,
    ) -> Self {
        Self {
            synth,
            collector,
            block_events: MidiBuffer::with_capacity(event_capacity.max(1)),
            params,
            initialised,
        }
    }

    /// Set the sample rate and start the event clock. Until this has run,
    /// renders are silent and control calls are refused.
    pub fn prepare_to_play(&mut self, sample_rate: f64) {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            log::warn!(target: "bridge", "prepare_to_play ignored: invalid sample rate {sample_rate}");
            return;
        }

        self.synth.reset();
        self.synth.set_current_playback_sample_rate(sample_rate as f32);
        self.collector.reset(sample_rate);
        self.initialised.store(true, Ordering::Release);

        log::info!(
            target: "bridge",
            "prepared at {sample_rate} Hz with {} voices",
            self.synth.num_voices()
        );
    }

    pub fn is_prepared(&self) -> bool {
        self.initialised.load(Ordering::Acquire)
    }

    /// Clear `output`, pull the events due in this block and render into it
    pub fn render_block(&mut self, output: &mut [f32]) {
        output.fill(0.0);
        if !self.is_prepared() || output.is_empty() {
            return;
        }

        self.collector
            .remove_next_block_of_messages(&mut self.block_events, output.len());
        let params = self.params.snapshot();
        self.synth.render_block(&self.block_events, output, &params);
    }

    /// Render into an interleaved device buffer, writing the same signal to
    /// every channel. `scratch` is the mono work area; devices asking for more
    /// frames than it holds are served in several `render_block` calls, so
    /// nothing is allocated here.
    pub fn render_interleaved<T: Copy>(
        &mut self,
        scratch: &mut [f32],
        output: &mut [T],
        channels: usize,
        convert: impl Fn(f32) -> T,
    ) {
        if channels == 0 {
            return;
        }
        if scratch.is_empty() {
            output.fill(convert(0.0));
            return;
        }

        for chunk in output.chunks_mut(scratch.len() * channels) {
            let frames = chunk.len() / channels;
            let mono = &mut scratch[..frames];
            self.render_block(mono);

            for (frame, sample) in chunk.chunks_mut(channels).zip(mono.iter()) {
                frame.fill(convert(*sample));
            }
            // A trailing partial frame gets silence
            for sample in &mut chunk[frames * channels..] {
                *sample = convert(0.0);
            }
        }
    }

    pub fn stats(&self) -> RenderStats {
        RenderStats {
            collector: self.collector.stats(),
            dropped_note_ons: self.synth.dropped_note_ons(),
            active_voices: self.synth.active_voice_count(),
        }
    }

    pub fn synthesiser(&self) -> &Synthesiser {
        &self.synth
    }

    pub fn sample_rate(&self) -> f64 {
        self.collector.sample_rate()
    }
}

#[cfg(test)]
mod tests {
    use crate::bridge::SynthBridge;
    use crate::clock::ManualClock;
    use std::sync::Arc;

    #[test]
    fn test_interleaved_render_spans_several_chunks() {
        let clock = ManualClock::new(0.0);
        let bridge = SynthBridge::initialize(4, 4, Arc::new(clock.clone()));
        let (controller, mut renderer) = bridge.split();
        renderer.prepare_to_play(48_000.0);

        controller.trigger_note_on(1, 69, 1.0);
        clock.advance_ms(5.0);

        let mut scratch = vec![0.0f32; 64];
        let mut output = vec![f32::MAX; 200 * 2];
        renderer.render_interleaved(&mut scratch, &mut output, 2, |s| s);

        assert!(output.iter().all(|&s| s != f32::MAX));
        assert!(output.chunks(2).all(|frame| frame[0] == frame[1]));
        assert!(output.iter().any(|&s| s != 0.0));
        assert_eq!(renderer.stats().collector.delivered, 1);
    }

    #[test]
    fn test_interleaved_render_without_scratch_is_silent() {
        let clock = ManualClock::new(0.0);
        let (_controller, mut renderer) = SynthBridge::initialize(1, 1, Arc::new(clock)).split();
        renderer.prepare_to_play(48_000.0);

        let mut output = vec![7i16; 8];
        renderer.render_interleaved(&mut [], &mut output, 2, |s| (s * 100.0) as i16);
        assert_eq!(output, vec![0; 8]);
    }
}
