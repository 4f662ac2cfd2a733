pub mod buffer;
pub mod collector;
pub mod handler;
pub mod message;

pub use buffer::MidiBuffer;
pub use collector::{CollectorConfig, CollectorStats, EventSender, MidiCollector, midi_collector};
pub use message::MidiMessage;
