use super::timer::{TimerHandle, TimerQueue};
use crate::midi::collector::EventSender;
use crate::types::events::MidiEvent;

/// One in-flight note owned by the note event player.
/// A slot is free whenever it is not active.
#[derive(Debug, Clone, Default)]
pub struct NoteSlot {
    index: usize,
    channel: u8,
    note: u8,
    on_velocity: f32,
    off_velocity: f32,
    duration_ms: f32,
    /// Clock time the NoteOn was stamped with
    started_at: f64,
    is_active: bool,
    has_note_off_scheduled: bool,
    timer: Option<TimerHandle>,
}

impl NoteSlot {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn has_note_off_scheduled(&self) -> bool {
        self.has_note_off_scheduled
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    /// The handle of the currently armed timer, if any
    pub fn timer(&self) -> Option<TimerHandle> {
        self.timer
    }

    /// Take over a free slot and emit its NoteOn at `now`
    #[allow(clippy::too_many_arguments)]
    pub fn start_note(
        &mut self,
        sender: &EventSender,
        timers: &mut TimerQueue,
        now: f64,
        channel: u8,
        note: u8,
        on_velocity: f32,
        off_velocity: f32,
        duration_ms: f32,
    ) {
        self.clear_timer(timers);

        self.channel = channel;
        self.note = note;
        self.on_velocity = on_velocity;
        self.off_velocity = off_velocity;
        self.duration_ms = duration_ms.max(0.0);
        self.started_at = now;
        self.is_active = true;
        self.has_note_off_scheduled = false;

        if !sender.add_message_to_queue(MidiEvent::note_on(channel, note, on_velocity, now)) {
            log::warn!(target: "notes", "event queue full, note on {channel}:{note} lost");
        }
    }

    /// Arm the automatic NoteOff. The deadline is anchored at the note's
    /// start, so how late the scan runs does not stretch the note.
    pub fn schedule_end_note(&mut self, timers: &mut TimerQueue) {
        if !self.is_active || self.has_note_off_scheduled {
            return;
        }

        let deadline = self.started_at + f64::from(self.duration_ms) / 1000.0;
        self.timer = Some(timers.schedule(deadline, self.index));
        self.has_note_off_scheduled = true;
    }

    /// Emit the NoteOff at `now` and return the slot to the pool.
    /// Calling it on an inactive slot does nothing.
    pub fn end_note(&mut self, sender: &EventSender, timers: &mut TimerQueue, now: f64) {
        self.clear_timer(timers);
        if !self.is_active {
            return;
        }

        let event = MidiEvent::note_off(self.channel, self.note, self.off_velocity, now);
        if !sender.add_message_to_queue(event) {
            log::warn!(target: "notes", "event queue full, note off {}:{} lost", self.channel, self.note);
        }

        *self = Self::new(self.index);
    }

    /// Cancel any pending timer; harmless when none is armed
    pub fn clear_timer(&mut self, timers: &mut TimerQueue) {
        if let Some(handle) = self.timer.take() {
            timers.cancel(handle);
        }
        self.has_note_off_scheduled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::midi::{CollectorConfig, MidiBuffer, MidiCollector, midi_collector};
    use std::sync::Arc;

    struct Fixture {
        clock: ManualClock,
        tx: EventSender,
        collector: MidiCollector,
        timers: TimerQueue,
    }

    fn setup() -> Fixture {
        let clock = ManualClock::new(0.0);
        let (tx, mut collector) = midi_collector(CollectorConfig::default(), Arc::new(clock.clone()));
        collector.reset(1_000.0);
        Fixture {
            clock,
            tx,
            collector,
            timers: TimerQueue::new(),
        }
    }

    /// Everything stamped within the next second
    fn drain(f: &mut Fixture) -> Vec<MidiEvent> {
        f.clock.advance(1.0);
        let mut block = MidiBuffer::with_capacity(16);
        f.collector.remove_next_block_of_messages(&mut block, 1_000);
        block.iter().map(|(_, e)| *e).collect()
    }

    #[test]
    fn test_start_note_emits_note_on() {
        let mut f = setup();
        let mut slot = NoteSlot::new(0);

        slot.start_note(&f.tx, &mut f.timers, 0.0, 1, 60, 1.0, 0.8, 500.0);

        assert!(slot.is_active());
        assert!(!slot.has_note_off_scheduled());
        assert_eq!(slot.note(), 60);
        assert_eq!(drain(&mut f), vec![MidiEvent::note_on(1, 60, 1.0, 0.0)]);
    }

    #[test]
    fn test_schedule_end_note_arms_once() {
        let mut f = setup();
        let mut slot = NoteSlot::new(3);

        slot.schedule_end_note(&mut f.timers);
        assert!(f.timers.is_empty());

        slot.start_note(&f.tx, &mut f.timers, 2.0, 1, 60, 1.0, 0.8, 500.0);
        slot.schedule_end_note(&mut f.timers);
        slot.schedule_end_note(&mut f.timers);

        assert!(slot.has_note_off_scheduled());
        assert_eq!(f.timers.len(), 1);
        assert_eq!(f.timers.next_deadline(), Some(2.5));
        assert_eq!(f.timers.pop_due(2.5), slot.timer().map(|handle| (handle, 3)));
    }

    #[test]
    fn test_end_note_is_idempotent() {
        let mut f = setup();
        let mut slot = NoteSlot::new(0);

        slot.start_note(&f.tx, &mut f.timers, 0.0, 2, 64, 1.0, 0.5, 100.0);
        slot.schedule_end_note(&mut f.timers);
        slot.end_note(&f.tx, &mut f.timers, 0.05);
        slot.end_note(&f.tx, &mut f.timers, 0.06);

        assert!(!slot.is_active());
        assert!(f.timers.is_empty());
        let events = drain(&mut f);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], MidiEvent::note_off(2, 64, 0.5, 0.05));
    }

    #[test]
    fn test_clear_timer_without_timer_is_safe() {
        let mut f = setup();
        let mut slot = NoteSlot::new(0);
        slot.clear_timer(&mut f.timers);
        assert!(slot.timer().is_none());
    }
}
