use super::parameters::VoiceParams;

/// ADSR Envelope Generator
/// Linear ramps driven by the shared parameters. Step sizes are recomputed
/// every sample from the current times, so a parameter change bends the
/// segment in progress instead of restarting it.
pub struct Envelope {
    stage: EnvelopeStage,
    /// Current envelope output level (0.0 to 1.0)
    level: f32,
    /// Level captured at note off; release ramps from here to zero
    release_level: f32,
    /// Sample rate in Hz
    sample_rate: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Samples a segment of `seconds` should take; never less than one
fn segment_samples(seconds: f32, sample_rate: f32) -> f32 {
    (seconds * sample_rate).max(1.0)
}

impl Envelope {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            stage: EnvelopeStage::Idle,
            level: 0.0,
            release_level: 0.0,
            sample_rate,
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Start (or restart) the attack from the current level
    pub fn note_on(&mut self) {
        self.stage = EnvelopeStage::Attack;
    }

    /// Start the release from wherever the envelope currently is
    pub fn note_off(&mut self) {
        if matches!(self.stage, EnvelopeStage::Idle | EnvelopeStage::Release) {
            return;
        }
        self.release_level = self.level;
        self.stage = EnvelopeStage::Release;
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.stage, EnvelopeStage::Idle)
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Advance one sample and return the new level
    pub fn next_sample(&mut self, params: &VoiceParams) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                self.level += 1.0 / segment_samples(params.attack, self.sample_rate);
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }

            EnvelopeStage::Decay => {
                let sustain = params.sustain.clamp(0.0, 1.0);
                self.level -= (1.0 - sustain) / segment_samples(params.decay, self.sample_rate);
                if self.level <= sustain {
                    self.level = sustain;
                    self.stage = EnvelopeStage::Sustain;
                }
            }

            EnvelopeStage::Sustain => {
                self.level = params.sustain.clamp(0.0, 1.0);
            }

            EnvelopeStage::Release => {
                self.level -= self.release_level / segment_samples(params.release, self.sample_rate);
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.release_level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        self.level
    }

    /// Drop straight to idle, no release tail
    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.release_level = 0.0;
    }
}
