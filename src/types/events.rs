/// Timestamped note event travelling from the control context to the renderer.
/// Cheap to copy so it can pass through the lock-free collector queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiEvent {
    NoteOn {
        channel: u8,
        note: u8,
        velocity: f32,
        /// Seconds on the bridge clock
        timestamp: f64,
    },
    NoteOff {
        channel: u8,
        note: u8,
        velocity: f32,
        timestamp: f64,
    },
}

impl MidiEvent {
    pub fn note_on(channel: u8, note: u8, velocity: f32, timestamp: f64) -> Self {
        MidiEvent::NoteOn {
            channel,
            note,
            velocity,
            timestamp,
        }
    }

    pub fn note_off(channel: u8, note: u8, velocity: f32, timestamp: f64) -> Self {
        MidiEvent::NoteOff {
            channel,
            note,
            velocity,
            timestamp,
        }
    }

    pub fn channel(&self) -> u8 {
        match self {
            MidiEvent::NoteOn { channel, .. } | MidiEvent::NoteOff { channel, .. } => *channel,
        }
    }

    pub fn note(&self) -> u8 {
        match self {
            MidiEvent::NoteOn { note, .. } | MidiEvent::NoteOff { note, .. } => *note,
        }
    }

    pub fn velocity(&self) -> f32 {
        match self {
            MidiEvent::NoteOn { velocity, .. } | MidiEvent::NoteOff { velocity, .. } => *velocity,
        }
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            MidiEvent::NoteOn { timestamp, .. } | MidiEvent::NoteOff { timestamp, .. } => {
                *timestamp
            }
        }
    }

    pub fn is_note_on(&self) -> bool {
        matches!(self, MidiEvent::NoteOn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_cover_both_variants() {
        let on = MidiEvent::note_on(1, 60, 0.9, 1.5);
        let off = MidiEvent::note_off(2, 64, 0.3, 2.0);

        assert!(on.is_note_on());
        assert!(!off.is_note_on());
        assert_eq!((on.channel(), on.note(), on.timestamp()), (1, 60, 1.5));
        assert_eq!((off.channel(), off.note(), off.velocity()), (2, 64, 0.3));
    }
}
