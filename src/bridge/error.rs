use crate::types::note::{MAX_CHANNEL, MAX_NOTE, MIN_CHANNEL};

/// Why a control call was refused. Never crosses into the render context;
/// the public control methods log it and carry on.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("bridge used before prepare_to_play")]
    Uninitialised,
    #[error("MIDI channel {0} out of range 1-16")]
    InvalidChannel(u8),
    #[error("MIDI note {0} out of range 0-127")]
    InvalidNote(u8),
    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f32 },
}

pub fn check_channel(channel: u8) -> Result<(), BridgeError> {
    if (MIN_CHANNEL..=MAX_CHANNEL).contains(&channel) {
        Ok(())
    } else {
        Err(BridgeError::InvalidChannel(channel))
    }
}

pub fn check_note(note: u8) -> Result<(), BridgeError> {
    if note <= MAX_NOTE {
        Ok(())
    } else {
        Err(BridgeError::InvalidNote(note))
    }
}

/// Seconds for an envelope segment: finite and not negative
pub fn check_seconds(name: &'static str, value: f32) -> Result<(), BridgeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(BridgeError::InvalidParameter { name, value })
    }
}

pub fn check_unit(name: &'static str, value: f32) -> Result<(), BridgeError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(BridgeError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_and_note_bounds() {
        assert!(check_channel(1).is_ok());
        assert!(check_channel(16).is_ok());
        assert_eq!(check_channel(0), Err(BridgeError::InvalidChannel(0)));
        assert_eq!(check_channel(17), Err(BridgeError::InvalidChannel(17)));

        assert!(check_note(127).is_ok());
        assert_eq!(check_note(128), Err(BridgeError::InvalidNote(128)));
    }

    #[test]
    fn test_parameter_checks() {
        assert!(check_seconds("attack", 0.0).is_ok());
        assert!(check_seconds("attack", -0.1).is_err());
        assert!(check_seconds("attack", f32::NAN).is_err());
        assert!(check_unit("sustain", 1.0).is_ok());
        assert!(check_unit("sustain", 1.5).is_err());
        assert!(check_unit("sustain", f32::NAN).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = BridgeError::InvalidParameter {
            name: "release",
            value: -1.0,
        };
        assert_eq!(err.to_string(), "invalid release: -1");
        assert_eq!(
            BridgeError::Uninitialised.to_string(),
            "bridge used before prepare_to_play"
        );
    }
}
