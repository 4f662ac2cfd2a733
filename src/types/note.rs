/// Note and velocity conversions, equal temperament at A440 (MIDI note 69)

/// Highest valid MIDI note number
pub const MAX_NOTE: u8 = 127;

/// MIDI channels are 1-based on the control API
pub const MIN_CHANNEL: u8 = 1;
pub const MAX_CHANNEL: u8 = 16;

/// Convert MIDI note number to frequency in Hz: f = 440 * 2^((n-69)/12)
pub fn midi_note_to_frequency(note: u8) -> f32 {
    const A4: f32 = 440.0;
    const A4_MIDI: i32 = 69;

    let semitones = note as i32 - A4_MIDI;
    A4 * 2.0_f32.powf(semitones as f32 / 12.0)
}

/// Convert a 7-bit MIDI velocity to the normalized 0.0-1.0 range
pub fn midi_velocity_to_amplitude(velocity: u8) -> f32 {
    (velocity as f32 / 127.0).clamp(0.0, 1.0)
}

/// Clamp an incoming velocity into 0.0-1.0; NaN counts as silent
pub fn normalize_velocity(velocity: f32) -> f32 {
    if velocity.is_nan() {
        0.0
    } else {
        velocity.clamp(0.0, 1.0)
    }
}
