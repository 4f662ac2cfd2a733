//! The bridge between note triggers and rendered audio.
//!
//! A [`SynthBridge`] owns both halves. Hosts that run control and audio on
//! separate threads call [`SynthBridge::split`] and move the
//! [`RenderDriver`] into the audio callback; the only thing the two halves
//! exchange is the event queue plus a handful of atomics.

pub mod control;
pub mod error;
pub mod render;

use std::sync::{Arc, atomic::AtomicBool};

use crate::audio::parameters::SynthParameters;
use crate::audio::synthesiser::Synthesiser;
use crate::clock::Clock;
use crate::config::BridgeConfig;
use crate::midi::collector::midi_collector;
use crate::notes::NoteEventPlayer;
use crate::types::waveform::Waveform;

pub use control::NoteController;
pub use error::BridgeError;
pub use render::{RenderDriver, RenderStats};

/// Sample rate voices run at until `prepare_to_play` sets the real one
const PLACEHOLDER_SAMPLE_RATE: f32 = 44_100.0;

pub struct SynthBridge {
    controller: NoteController,
    renderer: RenderDriver,
}

impl SynthBridge {
    /// Allocate `num_voices` voices and `num_note_slots` note slots with
    /// default settings for everything else
    pub fn initialize(num_voices: usize, num_note_slots: usize, clock: Arc<dyn Clock>) -> Self {
        let config = BridgeConfig {
            voices: num_voices,
            note_slots: num_note_slots,
            ..BridgeConfig::default()
        };
        Self::with_config(&config, clock)
    }

    pub fn with_config(config: &BridgeConfig, clock: Arc<dyn Clock>) -> Self {
        let params = Arc::new(SynthParameters::from_params(config.voice_params()));
        let initialised = Arc::new(AtomicBool::new(false));

        let (sender, collector) = midi_collector(config.collector_config(), Arc::clone(&clock));
        let player = NoteEventPlayer::new(config.note_slots, sender.clone(), Arc::clone(&clock));

        let controller = NoteController::new(
            player,
            sender,
            Arc::clone(&params),
            Arc::clone(&initialised),
            clock,
        );
        let renderer = RenderDriver::new(
            Synthesiser::new(config.voices, PLACEHOLDER_SAMPLE_RATE),
            collector,
            config.queue_capacity,
            params,
            initialised,
        );

        log::debug!(
            target: "bridge",
            "initialised {} voices, {} note slots",
            config.voices,
            config.note_slots
        );

        Self {
            controller,
            renderer,
        }
    }

    /// Separate the control half from the render half
    pub fn split(self) -> (NoteController, RenderDriver) {
        (self.controller, self.renderer)
    }

    pub fn controller(&mut self) -> &mut NoteController {
        &mut self.controller
    }

    pub fn renderer(&mut self) -> &mut RenderDriver {
        &mut self.renderer
    }

    pub fn prepare_to_play(&mut self, sample_rate: f64) {
        self.renderer.prepare_to_play(sample_rate);
    }

    pub fn render_block(&mut self, output: &mut [f32]) {
        self.renderer.render_block(output);
    }

    pub fn stats(&self) -> RenderStats {
        self.renderer.stats()
    }

    pub fn tick(&mut self, now: f64) {
        self.controller.tick(now);
    }

    pub fn play_note_event(
        &mut self,
        channel: u8,
        note: u8,
        on_velocity: f32,
        off_velocity: f32,
        duration_ms: f32,
    ) {
        self.controller
            .play_note_event(channel, note, on_velocity, off_velocity, duration_ms);
    }

    pub fn trigger_note_on(&self, channel: u8, note: u8, velocity: f32) {
        self.controller.trigger_note_on(channel, note, velocity);
    }

    pub fn trigger_note_off(&self, channel: u8, note: u8, velocity: f32) {
        self.controller.trigger_note_off(channel, note, velocity);
    }

    pub fn all_notes_off(&mut self) {
        self.controller.all_notes_off();
    }

    pub fn set_waveform_type(&self, waveform: Waveform) {
        self.controller.set_waveform_type(waveform);
    }

    pub fn set_attack_rate_seconds(&self, seconds: f32) {
        self.controller.set_attack_rate_seconds(seconds);
    }

    pub fn set_decay_rate_seconds(&self, seconds: f32) {
        self.controller.set_decay_rate_seconds(seconds);
    }

    pub fn set_sustain_level(&self, level: f32) {
        self.controller.set_sustain_level(level);
    }

    pub fn set_release_rate_seconds(&self, seconds: f32) {
        self.controller.set_release_rate_seconds(seconds);
    }
}
