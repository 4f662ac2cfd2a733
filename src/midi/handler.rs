use anyhow::{Result, anyhow};
use crossbeam_channel::Sender;
use midir::{MidiInput, MidiInputConnection};

use super::message::MidiMessage;

/// MIDI input handler
/// Parses device bytes on midir's thread and hands them to the control loop,
/// which owns the note controller.
pub struct MidiHandler {
    _connection: MidiInputConnection<()>,
}

impl MidiHandler {
    /// Connect to the input port at `device_index`
    pub fn new_with_device(message_tx: Sender<MidiMessage>, device_index: usize) -> Result<Self> {
        let midi_in = MidiInput::new("synth-bridge-input")?;
        let ports = midi_in.ports();

        let port = ports
            .get(device_index)
            .ok_or_else(|| anyhow!("MIDI device index {} not available", device_index))?;
        let port_name = midi_in
            .port_name(port)
            .unwrap_or_else(|_| "Unknown".to_string());

        log::info!(target: "midi", "connecting to MIDI input: {port_name}");

        let connection = midi_in
            .connect(
                port,
                "synth-bridge-input",
                move |_timestamp, bytes, _| {
                    let message = MidiMessage::parse(bytes);
                    if message != MidiMessage::Unknown {
                        // try_send so the MIDI thread never blocks
                        let _ = message_tx.try_send(message);
                    }
                },
                (),
            )
            .map_err(|e| anyhow!("Failed to connect to MIDI port: {}", e))?;

        Ok(Self {
            _connection: connection,
        })
    }

    /// List all available MIDI input devices
    pub fn list_devices() -> Result<Vec<String>> {
        let midi_in = MidiInput::new("synth-bridge-list")?;
        let ports = midi_in.ports();

        let devices = ports
            .iter()
            .filter_map(|port| midi_in.port_name(port).ok())
            .collect();

        Ok(devices)
    }
}
