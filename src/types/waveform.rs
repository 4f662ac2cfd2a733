use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Periodic oscillator shapes, selected process-wide for every voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

impl Waveform {
    /// Encode for the atomic parameter store
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Decode from the atomic parameter store; unknown values fall back to sine
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Waveform::Triangle,
            2 => Waveform::Sawtooth,
            3 => Waveform::Square,
            _ => Waveform::Sine,
        }
    }

    /// Evaluate the shape at `phase` in [0, 1). Output is in [-1, 1].
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Triangle => {
                if phase < 0.5 {
                    4.0 * phase - 1.0
                } else {
                    3.0 - 4.0 * phase
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}
