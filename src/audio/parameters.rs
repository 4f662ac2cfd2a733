use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};

use crate::types::waveform::Waveform;

/// Thread-safe parameter storage using atomic operations.
/// The control context writes, the render context reads once per block.
pub struct SynthParameters {
    /// Oscillator shape shared by every voice (stored as `Waveform::to_u8`)
    pub waveform: AtomicU8,
    /// ADSR Attack time in seconds
    pub attack: AtomicF32,
    /// ADSR Decay time in seconds
    pub decay: AtomicF32,
    /// ADSR Sustain level (0.0 to 1.0)
    pub sustain: AtomicF32,
    /// ADSR Release time in seconds
    pub release: AtomicF32,
    /// Output gain applied per voice
    pub gain: AtomicF32,
}

impl SynthParameters {
    pub fn new() -> Self {
        Self::from_params(VoiceParams::default())
    }

    pub fn from_params(params: VoiceParams) -> Self {
        Self {
            waveform: AtomicU8::new(params.waveform.to_u8()),
            attack: AtomicF32::new(params.attack),
            decay: AtomicF32::new(params.decay),
            sustain: AtomicF32::new(params.sustain),
            release: AtomicF32::new(params.release),
            gain: AtomicF32::new(params.gain),
        }
    }

    /// Take a consistent-enough copy for one render block
    pub fn snapshot(&self) -> VoiceParams {
        VoiceParams {
            waveform: Waveform::from_u8(self.waveform.load(Ordering::Relaxed)),
            attack: self.attack.load(Ordering::Relaxed),
            decay: self.decay.load(Ordering::Relaxed),
            sustain: self.sustain.load(Ordering::Relaxed),
            release: self.release.load(Ordering::Relaxed),
            gain: self.gain.load(Ordering::Relaxed),
        }
    }
}

impl Default for SynthParameters {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of the shared parameters handed to every voice's render step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceParams {
    pub waveform: Waveform,
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub gain: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            attack: 0.01,  // 10ms
            decay: 0.1,    // 100ms
            sustain: 0.7,  // 70%
            release: 0.1,  // 100ms
            gain: 0.25,
        }
    }
}

/// Atomic f32 wrapper for lock-free parameter updates
pub struct AtomicF32 {
    storage: AtomicU32,
}

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self {
            storage: AtomicU32::new(value.to_bits()),
        }
    }

    pub fn load(&self, ordering: Ordering) -> f32 {
        f32::from_bits(self.storage.load(ordering))
    }

    pub fn store(&self, value: f32, ordering: Ordering) {
        self.storage.store(value.to_bits(), ordering);
    }
}
