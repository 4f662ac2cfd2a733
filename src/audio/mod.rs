pub mod envelope;
pub mod oscillator;
pub mod parameters;
pub mod synthesiser;
pub mod vca;
pub mod voice;

pub use parameters::{SynthParameters, VoiceParams};
pub use synthesiser::Synthesiser;
pub use voice::Voice;
