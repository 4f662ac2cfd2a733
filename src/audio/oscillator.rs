use crate::types::waveform::Waveform;

/// Phase-accumulating oscillator. The shape is passed in per sample so the
/// process-wide waveform setting reaches every voice on the next block.
pub struct Oscillator {
    /// Current phase position (0.0 to 1.0)
    phase: f32,
    /// Phase increment per sample (frequency / sample_rate)
    phase_delta: f32,
    /// Current frequency in Hz
    frequency: f32,
    /// Sample rate in Hz
    sample_rate: f32,
}

impl Oscillator {
    pub fn new(sample_rate: f32) -> Self {
        let mut osc = Self {
            phase: 0.0,
            phase_delta: 0.0,
            frequency: 440.0,
            sample_rate,
        };
        osc.update_phase_delta();
        osc
    }

    pub fn set_frequency(&mut self, freq: f32) {
        self.frequency = freq;
        self.update_phase_delta();
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_phase_delta();
    }

    fn update_phase_delta(&mut self) {
        self.phase_delta = if self.sample_rate > 0.0 {
            self.frequency / self.sample_rate
        } else {
            0.0
        };
    }

    /// Generate next sample and advance phase
    pub fn next_sample(&mut self, waveform: Waveform) -> f32 {
        let output = waveform.sample(self.phase);

        self.phase += self.phase_delta;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        output
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_update() {
        let mut osc = Oscillator::new(44100.0);
        osc.set_frequency(880.0);
        assert_eq!(osc.frequency, 880.0);
        assert!((osc.phase_delta - 880.0 / 44100.0).abs() < 1e-9);
    }

    #[test]
    fn test_phase_wraps_into_unit_interval() {
        let mut osc = Oscillator::new(100.0);
        osc.set_frequency(30.0);
        for _ in 0..1000 {
            osc.next_sample(Waveform::Sine);
            assert!((0.0..1.0).contains(&osc.phase()));
        }
    }

    #[test]
    fn test_sine_matches_closed_form() {
        let sample_rate = 48_000.0;
        let mut osc = Oscillator::new(sample_rate);
        osc.set_frequency(440.0);

        let mut last = 0.0;
        for _ in 0..=12 {
            last = osc.next_sample(Waveform::Sine);
        }
        let expected = (std::f32::consts::TAU * 440.0 * 12.0 / sample_rate).sin();
        assert!((last - expected).abs() < 1e-4, "expected {expected}, got {last}");
    }
}
