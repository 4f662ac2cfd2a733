use super::{
    envelope::{Envelope, EnvelopeStage},
    oscillator::Oscillator,
    parameters::VoiceParams,
    vca::VCA,
};
use crate::types::note::midi_note_to_frequency;

/// Single synthesizer voice
/// Complete signal chain: Oscillator → Envelope → VCA
pub struct Voice {
    oscillator: Oscillator,
    envelope: Envelope,
    vca: VCA,
    /// (channel, note) currently assigned, None while idle
    assigned: Option<(u8, u8)>,
}

impl Voice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            oscillator: Oscillator::new(sample_rate),
            envelope: Envelope::new(sample_rate),
            vca: VCA::new(),
            assigned: None,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.oscillator.set_sample_rate(sample_rate);
        self.envelope.set_sample_rate(sample_rate);
    }

    /// Assign a note and enter Attack. Restarting a sounding voice keeps its
    /// phase and level so the retrigger does not click.
    pub fn start_note(&mut self, channel: u8, note: u8, velocity: f32) {
        if self.is_free() {
            self.oscillator.reset();
        }
        self.oscillator.set_frequency(midi_note_to_frequency(note));
        self.vca.set_velocity(velocity);
        self.envelope.note_on();
        self.assigned = Some((channel, note));
    }

    /// Move into Release from the current level
    pub fn stop_note(&mut self) {
        self.envelope.note_off();
    }

    /// A voice is free iff its envelope is idle
    pub fn is_free(&self) -> bool {
        !self.envelope.is_active()
    }

    /// True while this voice holds (channel, note), releasing or not
    pub fn is_playing(&self, channel: u8, note: u8) -> bool {
        self.assigned == Some((channel, note))
    }

    /// True if note off for (channel, note) should reach this voice
    pub fn is_held(&self, channel: u8, note: u8) -> bool {
        self.is_playing(channel, note) && self.stage() != EnvelopeStage::Release
    }

    pub fn current_note(&self) -> Option<u8> {
        self.assigned.map(|(_, note)| note)
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.envelope.stage()
    }

    pub fn level(&self) -> f32 {
        self.envelope.level()
    }

    /// Add this voice's output into `out`, one sample per slot
    pub fn render(&mut self, out: &mut [f32], params: &VoiceParams) {
        if self.is_free() {
            return;
        }

        for sample in out.iter_mut() {
            let osc = self.oscillator.next_sample(params.waveform);
            let level = self.envelope.next_sample(params);
            *sample += self.vca.process(osc, level, params.gain);

            if !self.envelope.is_active() {
                self.assigned = None;
                break;
            }
        }
    }

    /// Silence immediately and forget the note
    pub fn reset(&mut self) {
        self.envelope.reset();
        self.oscillator.reset();
        self.assigned = None;
    }
}
