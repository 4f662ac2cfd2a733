pub mod events;
pub mod note;
pub mod waveform;

pub use events::MidiEvent;
pub use waveform::Waveform;
