use crate::types::note::midi_velocity_to_amplitude;

/// Raw MIDI messages the host forwards into the bridge.
/// Channels are reported 1-16 to match the control API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    Unknown,
}

/// CC 123: All Notes Off
const ALL_NOTES_OFF_CC: u8 = 123;

impl MidiMessage {
    /// Parse raw MIDI bytes: [status, data1, data2]
    pub fn parse(bytes: &[u8]) -> Self {
        let [status, data1, data2, ..] = *bytes else {
            return MidiMessage::Unknown;
        };

        let channel = (status & 0x0F) + 1;
        match status & 0xF0 {
            // Note On with velocity 0 is a Note Off
            0x90 if data2 == 0 => MidiMessage::NoteOff {
                channel,
                note: data1,
                velocity: 0,
            },
            0x90 => MidiMessage::NoteOn {
                channel,
                note: data1,
                velocity: data2,
            },
            0x80 => MidiMessage::NoteOff {
                channel,
                note: data1,
                velocity: data2,
            },
            0xB0 => MidiMessage::ControlChange {
                channel,
                controller: data1,
                value: data2,
            },
            _ => MidiMessage::Unknown,
        }
    }

    /// Velocity normalized to 0.0-1.0 for note messages
    pub fn normalized_velocity(&self) -> Option<f32> {
        match self {
            MidiMessage::NoteOn { velocity, .. } | MidiMessage::NoteOff { velocity, .. } => {
                Some(midi_velocity_to_amplitude(*velocity))
            }
            _ => None,
        }
    }

    pub fn is_all_notes_off(&self) -> bool {
        matches!(
            self,
            MidiMessage::ControlChange {
                controller: ALL_NOTES_OFF_CC,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_on() {
        let msg = MidiMessage::parse(&[0x90, 60, 100]);
        assert_eq!(
            msg,
            MidiMessage::NoteOn {
                channel: 1,
                note: 60,
                velocity: 100
            }
        );
    }

    #[test]
    fn test_parse_note_off_on_channel_ten() {
        let msg = MidiMessage::parse(&[0x89, 38, 64]);
        assert_eq!(
            msg,
            MidiMessage::NoteOff {
                channel: 10,
                note: 38,
                velocity: 64
            }
        );
    }

    #[test]
    fn test_note_on_velocity_zero_is_note_off() {
        let msg = MidiMessage::parse(&[0x90, 60, 0]);
        assert!(matches!(msg, MidiMessage::NoteOff { .. }));
    }

    #[test]
    fn test_short_and_unsupported_messages() {
        assert_eq!(MidiMessage::parse(&[]), MidiMessage::Unknown);
        assert_eq!(MidiMessage::parse(&[0x90, 60]), MidiMessage::Unknown);
        assert_eq!(MidiMessage::parse(&[0xE0, 0, 64]), MidiMessage::Unknown);
    }

    #[test]
    fn test_all_notes_off_and_velocity() {
        assert!(MidiMessage::parse(&[0xB3, 123, 0]).is_all_notes_off());
        assert!(!MidiMessage::parse(&[0xB3, 7, 100]).is_all_notes_off());

        let vel = MidiMessage::parse(&[0x90, 60, 127]).normalized_velocity();
        assert_eq!(vel, Some(1.0));
    }
}
