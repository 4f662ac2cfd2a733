/// VCA (Voltage Controlled Amplifier)
/// Scales the oscillator by the envelope, the note velocity and the voice gain
pub struct VCA {
    /// Note-on velocity (0.0 to 1.0), latched per note
    velocity: f32,
}

impl VCA {
    pub fn new() -> Self {
        Self { velocity: 1.0 }
    }

    pub fn set_velocity(&mut self, velocity: f32) {
        self.velocity = velocity.clamp(0.0, 1.0);
    }

    /// signal: oscillator output, modulation: envelope level, gain: shared voice gain
    pub fn process(&self, signal: f32, modulation: f32, gain: f32) -> f32 {
        signal * modulation * self.velocity * gain
    }
}

impl Default for VCA {
    fn default() -> Self {
        Self::new()
    }
}
