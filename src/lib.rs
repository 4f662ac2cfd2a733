//! Polyphonic note-event synthesiser bridge.
//!
//! Note triggers from any thread become timestamped events on a lock-free
//! queue; a real-time render driver drains the events due in each audio
//! block and plays them sample-accurately on a fixed bank of ADSR voices.
//! Notes started through the slot pool release themselves after their
//! duration, driven by a periodic `tick`.

pub mod audio;
pub mod bridge;
pub mod clock;
pub mod config;
pub mod midi;
pub mod notes;
pub mod types;

pub use bridge::{BridgeError, NoteController, RenderDriver, RenderStats, SynthBridge};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::BridgeConfig;
pub use types::{MidiEvent, Waveform};
