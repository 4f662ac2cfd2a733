use super::{parameters::VoiceParams, voice::Voice};
use crate::midi::buffer::MidiBuffer;
use crate::types::events::MidiEvent;

/// Fixed bank of voices sharing one sound definition.
/// Voices are pre-allocated at construction; rendering never allocates.
pub struct Synthesiser {
    voices: Vec<Voice>,
    sample_rate: f32,
    /// Note-ons that found no free voice
    dropped_note_ons: u64,
}

impl Synthesiser {
    pub fn new(num_voices: usize, sample_rate: f32) -> Self {
        Self {
            voices: (0..num_voices).map(|_| Voice::new(sample_rate)).collect(),
            sample_rate,
            dropped_note_ons: 0,
        }
    }

    pub fn num_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn set_current_playback_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
        }
    }

    pub fn dropped_note_ons(&self) -> u64 {
        self.dropped_note_ons
    }

    /// Apply one event immediately
    pub fn handle_event(&mut self, event: &MidiEvent) {
        match *event {
            MidiEvent::NoteOn {
                channel,
                note,
                velocity,
                ..
            } => self.note_on(channel, note, velocity),
            MidiEvent::NoteOff { channel, note, .. } => self.note_off(channel, note),
        }
    }

    /// Retrigger a voice already holding this note, otherwise take the first
    /// free voice. With every voice busy the note is dropped.
    fn note_on(&mut self, channel: u8, note: u8, velocity: f32) {
        let idx = self
            .voices
            .iter()
            .position(|v| v.is_playing(channel, note))
            .or_else(|| self.voices.iter().position(|v| v.is_free()));

        match idx {
            Some(idx) => self.voices[idx].start_note(channel, note, velocity),
            None => self.dropped_note_ons += 1,
        }
    }

    /// Release every voice holding (channel, note)
    fn note_off(&mut self, channel: u8, note: u8) {
        for voice in &mut self.voices {
            if voice.is_held(channel, note) {
                voice.stop_note();
            }
        }
    }

    /// Render `output.len()` samples, applying each event at its offset.
    /// Output is added to, so the caller clears the buffer first.
    pub fn render_block(&mut self, events: &MidiBuffer, output: &mut [f32], params: &VoiceParams) {
        let num_samples = output.len();
        let mut position = 0;

        for (offset, event) in events {
            let offset = (*offset).min(num_samples);
            if offset > position {
                self.render_voices(&mut output[position..offset], params);
                position = offset;
            }
            self.handle_event(event);
        }

        if position < num_samples {
            self.render_voices(&mut output[position..], params);
        }
    }

    fn render_voices(&mut self, output: &mut [f32], params: &VoiceParams) {
        for voice in &mut self.voices {
            voice.render(output, params);
        }
    }

    /// Note held by each voice, None if idle
    pub fn voice_states(&self) -> impl Iterator<Item = Option<u8>> + '_ {
        self.voices.iter().map(|v| v.current_note())
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| !v.is_free()).count()
    }

    pub fn voice(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    /// Hard stop of every voice
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::envelope::EnvelopeStage;

    const SAMPLE_RATE: f32 = 44_100.0;

    fn buffer_with(events: &[(usize, MidiEvent)]) -> MidiBuffer {
        let mut buffer = MidiBuffer::with_capacity(16);
        for (offset, event) in events {
            buffer.add_event(*offset, *event);
        }
        buffer
    }

    #[test]
    fn test_silent_block_with_idle_voices() {
        let mut synth = Synthesiser::new(4, SAMPLE_RATE);
        let mut output = vec![0.0f32; 512];

        synth.render_block(&MidiBuffer::with_capacity(4), &mut output, &VoiceParams::default());

        assert_eq!(output.len(), 512);
        assert!(output.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_voice_allocation_first_fit() {
        let mut synth = Synthesiser::new(4, SAMPLE_RATE);
        let events = buffer_with(&[
            (0, MidiEvent::note_on(1, 60, 1.0, 0.0)),
            (0, MidiEvent::note_on(1, 64, 1.0, 0.0)),
        ]);
        let mut output = vec![0.0f32; 64];
        synth.render_block(&events, &mut output, &VoiceParams::default());

        let states: Vec<Option<u8>> = synth.voice_states().collect();
        assert_eq!(states, vec![Some(60), Some(64), None, None]);
    }

    #[test]
    fn test_exhausted_bank_drops_note_without_stealing() {
        let mut synth = Synthesiser::new(2, SAMPLE_RATE);
        let events = buffer_with(&[
            (0, MidiEvent::note_on(1, 60, 1.0, 0.0)),
            (0, MidiEvent::note_on(1, 62, 1.0, 0.0)),
            (0, MidiEvent::note_on(1, 64, 1.0, 0.0)),
        ]);
        let mut output = vec![0.0f32; 64];
        synth.render_block(&events, &mut output, &VoiceParams::default());

        let states: Vec<Option<u8>> = synth.voice_states().collect();
        assert_eq!(states, vec![Some(60), Some(62)]);
        assert_eq!(synth.dropped_note_ons(), 1);
    }

    #[test]
    fn test_note_off_releases_matching_channel_only() {
        let mut synth = Synthesiser::new(2, SAMPLE_RATE);
        let events = buffer_with(&[
            (0, MidiEvent::note_on(1, 60, 1.0, 0.0)),
            (0, MidiEvent::note_on(2, 60, 1.0, 0.0)),
            (10, MidiEvent::note_off(2, 60, 0.0, 0.0)),
        ]);
        let mut output = vec![0.0f32; 32];
        synth.render_block(&events, &mut output, &VoiceParams::default());

        assert_eq!(synth.voice(0).unwrap().stage(), EnvelopeStage::Attack);
        assert_eq!(synth.voice(1).unwrap().stage(), EnvelopeStage::Release);
    }

    #[test]
    fn test_note_on_and_off_inside_one_block() {
        let params = VoiceParams {
            attack: 0.01,
            release: 0.001,
            ..VoiceParams::default()
        };
        let mut synth = Synthesiser::new(1, SAMPLE_RATE);
        let events = buffer_with(&[
            (0, MidiEvent::note_on(1, 69, 1.0, 0.0)),
            (100, MidiEvent::note_off(1, 69, 0.0, 0.0)),
        ]);
        let mut output = vec![0.0f32; 512];
        synth.render_block(&events, &mut output, &params);

        // Attack reached only 100 / 441 of full level before release
        let peak_before = output[..100].iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        let peak_after = output[100..].iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak_before > 0.0);
        assert!(peak_after <= peak_before + 1e-3);

        assert!(synth.voice(0).unwrap().is_free());
        assert!(output[200..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_repeated_note_on_reuses_sounding_voice() {
        let mut synth = Synthesiser::new(3, SAMPLE_RATE);
        let events = buffer_with(&[
            (0, MidiEvent::note_on(1, 60, 1.0, 0.0)),
            (5, MidiEvent::note_on(1, 60, 0.5, 0.0)),
        ]);
        let mut output = vec![0.0f32; 16];
        synth.render_block(&events, &mut output, &VoiceParams::default());

        assert_eq!(synth.active_voice_count(), 1);
    }

    #[test]
    fn test_sample_rate_reaches_every_voice() {
        let mut synth = Synthesiser::new(2, 0.0);
        synth.set_current_playback_sample_rate(48_000.0);
        assert_eq!(synth.sample_rate(), 48_000.0);

        let events = buffer_with(&[(0, MidiEvent::note_on(1, 69, 1.0, 0.0))]);
        let mut output = vec![0.0f32; 64];
        synth.render_block(&events, &mut output, &VoiceParams::default());
        assert!(output.iter().any(|s| s.abs() > 0.0));
    }
}
