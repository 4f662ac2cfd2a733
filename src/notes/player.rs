use std::sync::Arc;

use super::slot::NoteSlot;
use super::timer::TimerQueue;
use crate::clock::Clock;
use crate::midi::collector::EventSender;

/// Fixed pool of note slots plus the deadline queue that releases them.
/// Lives entirely on the control context.
pub struct NoteEventPlayer {
    slots: Vec<NoteSlot>,
    timers: TimerQueue,
    sender: EventSender,
    clock: Arc<dyn Clock>,
}

impl NoteEventPlayer {
    pub fn new(num_slots: usize, sender: EventSender, clock: Arc<dyn Clock>) -> Self {
        let mut player = Self {
            slots: Vec::new(),
            timers: TimerQueue::new(),
            sender,
            clock,
        };
        player.set_number_of_note_slots(num_slots);
        player
    }

    /// Drop every slot and pending timer and allocate `num_slots` fresh ones.
    /// Sounding notes are abandoned without a NoteOff.
    pub fn set_number_of_note_slots(&mut self, num_slots: usize) {
        for slot in &mut self.slots {
            slot.clear_timer(&mut self.timers);
        }
        self.timers.clear();
        self.slots = (0..num_slots).map(NoteSlot::new).collect();
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_active()).count()
    }

    pub fn slots(&self) -> &[NoteSlot] {
        &self.slots
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Start a note in the first free slot. When every slot is busy the note
    /// is dropped; returns whether it was started.
    pub fn start_note_event(
        &mut self,
        channel: u8,
        note: u8,
        on_velocity: f32,
        off_velocity: f32,
        duration_ms: f32,
    ) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|slot| !slot.is_active()) else {
            log::debug!(target: "notes", "no free note slot, dropping {channel}:{note}");
            return false;
        };

        slot.start_note(
            &self.sender,
            &mut self.timers,
            self.clock.now(),
            channel,
            note,
            on_velocity,
            off_velocity,
            duration_ms,
        );
        true
    }

    /// Arm the NoteOff timer of every active slot that does not have one yet
    pub fn schedule_note_ends_for_active_notes(&mut self) {
        for slot in &mut self.slots {
            slot.schedule_end_note(&mut self.timers);
        }
    }

    /// End every slot whose timer is due at `now`. Returns how many fired.
    pub fn fire_due_timers(&mut self, now: f64) -> usize {
        let mut fired = 0;
        while let Some((handle, index)) = self.timers.pop_due(now) {
            let Some(slot) = self.slots.get_mut(index) else {
                continue;
            };
            // A slot that was ended and restarted carries a new handle
            if slot.timer() != Some(handle) {
                continue;
            }
            slot.end_note(&self.sender, &mut self.timers, self.clock.now());
            fired += 1;
        }
        fired
    }

    /// One pass of the control cadence: arm new timers, then fire due ones
    pub fn tick(&mut self, now: f64) -> usize {
        self.schedule_note_ends_for_active_notes();
        self.fire_due_timers(now)
    }

    /// End every active slot now, emitting their NoteOffs
    pub fn all_notes_off(&mut self) {
        let now = self.clock.now();
        for slot in &mut self.slots {
            slot.end_note(&self.sender, &mut self.timers, now);
        }
        self.timers.clear();
    }
}

impl Drop for NoteEventPlayer {
    fn drop(&mut self) {
        for slot in &mut self.slots {
            slot.clear_timer(&mut self.timers);
        }
    }
}
