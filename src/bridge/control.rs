use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use super::error::{BridgeError, check_channel, check_note, check_seconds, check_unit};
use crate::audio::parameters::{SynthParameters, VoiceParams};
use crate::clock::Clock;
use crate::midi::collector::EventSender;
use crate::notes::NoteEventPlayer;
use crate::types::events::MidiEvent;
use crate::types::note::normalize_velocity;
use crate::types::waveform::Waveform;

/// Control-context half of the bridge: note triggers, the slot pool, the
/// scheduling tick and parameter changes. Every call made before the render
/// side has been prepared is refused with a warning.
pub struct NoteController {
    player: NoteEventPlayer,
    sender: EventSender,
    params: Arc<SynthParameters>,
    initialised: Arc<AtomicBool>,
    clock: Arc<dyn Clock>,
}

impl NoteController {
    pub(crate) fn new(
        player: NoteEventPlayer,
        sender: EventSender,
        params: Arc<SynthParameters>,
        initialised: Arc<AtomicBool>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            player,
            sender,
            params,
            initialised,
            clock,
        }
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised.load(Ordering::Acquire)
    }

    /// Notes currently held by the slot pool
    pub fn active_notes(&self) -> usize {
        self.player.active_count()
    }

    pub fn num_note_slots(&self) -> usize {
        self.player.num_slots()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current values of the shared synth parameters
    pub fn parameters(&self) -> VoiceParams {
        self.params.snapshot()
    }

    /// Start a note in a free slot; it is released `duration_ms` after it
    /// starts, on the first `tick` past that point. A full pool drops it.
    pub fn play_note_event(
        &mut self,
        channel: u8,
        note: u8,
        on_velocity: f32,
        off_velocity: f32,
        duration_ms: f32,
    ) {
        let result = self.ready().and_then(|()| {
            check_channel(channel)?;
            check_note(note)?;
            check_seconds("duration_ms", duration_ms)
        });
        if let Err(e) = result {
            log::warn!(target: "bridge", "play_note_event({channel}, {note}) ignored: {e}");
            return;
        }

        self.player.start_note_event(
            channel,
            note,
            normalize_velocity(on_velocity),
            normalize_velocity(off_velocity),
            duration_ms,
        );
    }

    /// Queue a NoteOn straight to the renderer, outside the slot pool
    pub fn trigger_note_on(&self, channel: u8, note: u8, velocity: f32) {
        let event = MidiEvent::note_on(channel, note, normalize_velocity(velocity), self.clock.now());
        self.send("trigger_note_on", event);
    }

    /// Queue a NoteOff straight to the renderer, outside the slot pool
    pub fn trigger_note_off(&self, channel: u8, note: u8, velocity: f32) {
        let event = MidiEvent::note_off(channel, note, normalize_velocity(velocity), self.clock.now());
        self.send("trigger_note_off", event);
    }

    fn send(&self, op: &str, event: MidiEvent) {
        let result = self.ready().and_then(|()| {
            check_channel(event.channel())?;
            check_note(event.note())
        });
        match result {
            Ok(()) => {
                if !self.sender.add_message_to_queue(event) {
                    log::warn!(target: "bridge", "{op}: event queue full, dropped");
                }
            }
            Err(e) => {
                log::warn!(target: "bridge", "{op}({}, {}) ignored: {e}", event.channel(), event.note());
            }
        }
    }

    /// Drive the slot pool: arm auto-release for newly started notes and
    /// fire any release that is due at `now`
    pub fn tick(&mut self, now: f64) {
        let fired = self.player.tick(now);
        if fired > 0 {
            log::debug!(target: "notes", "released {fired} note(s) at {now:.3}");
        }
    }

    /// End every note held by the slot pool and cancel its timers
    pub fn all_notes_off(&mut self) {
        if let Err(e) = self.ready() {
            log::warn!(target: "bridge", "all_notes_off ignored: {e}");
            return;
        }
        self.player.all_notes_off();
    }

    pub fn set_waveform_type(&self, waveform: Waveform) {
        if self.guard("set_waveform_type", Ok(())) {
            self.params.waveform.store(waveform.to_u8(), Ordering::Relaxed);
        }
    }

    pub fn set_attack_rate_seconds(&self, seconds: f32) {
        if self.guard("set_attack_rate_seconds", check_seconds("attack", seconds)) {
            self.params.attack.store(seconds, Ordering::Relaxed);
        }
    }

    pub fn set_decay_rate_seconds(&self, seconds: f32) {
        if self.guard("set_decay_rate_seconds", check_seconds("decay", seconds)) {
            self.params.decay.store(seconds, Ordering::Relaxed);
        }
    }

    pub fn set_sustain_level(&self, level: f32) {
        if self.guard("set_sustain_level", check_unit("sustain", level)) {
            self.params.sustain.store(level, Ordering::Relaxed);
        }
    }

    pub fn set_release_rate_seconds(&self, seconds: f32) {
        if self.guard("set_release_rate_seconds", check_seconds("release", seconds)) {
            self.params.release.store(seconds, Ordering::Relaxed);
        }
    }

    pub fn set_gain(&self, gain: f32) {
        if self.guard("set_gain", check_unit("gain", gain)) {
            self.params.gain.store(gain, Ordering::Relaxed);
        }
    }

    fn ready(&self) -> Result<(), BridgeError> {
        if self.is_initialised() {
            Ok(())
        } else {
            Err(BridgeError::Uninitialised)
        }
    }

    /// Log and swallow a refused setter
    fn guard(&self, op: &str, check: Result<(), BridgeError>) -> bool {
        match self.ready().and(check) {
            Ok(()) => true,
            Err(e) => {
                log::warn!(target: "bridge", "{op} ignored: {e}");
                false
            }
        }
    }
}
