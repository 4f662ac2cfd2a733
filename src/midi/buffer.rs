use crate::types::events::MidiEvent;

/// Events for one audio block, each tagged with its sample offset.
/// Storage is reserved up front and reused block after block; pushes beyond
/// capacity are refused rather than reallocating on the render thread.
pub struct MidiBuffer {
    events: Vec<(usize, MidiEvent)>,
}

impl MidiBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.events.capacity()
    }

    /// Insert ordered by offset, then timestamp; full ties keep insertion order.
    /// Returns false when the buffer is full.
    pub fn add_event(&mut self, offset: usize, event: MidiEvent) -> bool {
        if self.events.len() == self.events.capacity() {
            return false;
        }

        let timestamp = event.timestamp();
        let at = self
            .events
            .iter()
            .rposition(|(existing, e)| {
                *existing < offset || (*existing == offset && e.timestamp() <= timestamp)
            })
            .map_or(0, |idx| idx + 1);
        self.events.insert(at, (offset, event));
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, MidiEvent)> {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a MidiBuffer {
    type Item = &'a (usize, MidiEvent);
    type IntoIter = std::slice::Iter<'a, (usize, MidiEvent)>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on(note: u8) -> MidiEvent {
        MidiEvent::note_on(1, note, 1.0, 0.0)
    }

    #[test]
    fn test_events_sorted_by_offset_with_stable_ties() {
        let mut buffer = MidiBuffer::with_capacity(8);
        buffer.add_event(10, on(1));
        buffer.add_event(3, on(2));
        buffer.add_event(10, on(3));
        buffer.add_event(0, on(4));

        let notes: Vec<(usize, u8)> = buffer.iter().map(|(o, e)| (*o, e.note())).collect();
        assert_eq!(notes, vec![(0, 4), (3, 2), (10, 1), (10, 3)]);
    }

    #[test]
    fn test_same_offset_orders_by_timestamp() {
        let mut buffer = MidiBuffer::with_capacity(4);
        buffer.add_event(0, MidiEvent::note_off(1, 60, 0.0, 0.002));
        buffer.add_event(0, MidiEvent::note_on(1, 60, 1.0, 0.001));

        let first = buffer.iter().next().map(|(_, e)| *e);
        assert!(first.is_some_and(|e| e.is_note_on()));
    }

    #[test]
    fn test_full_buffer_refuses_without_growing() {
        let mut buffer = MidiBuffer::with_capacity(2);
        let capacity = buffer.capacity();
        for i in 0..capacity {
            assert!(buffer.add_event(i, on(i as u8)));
        }
        assert!(!buffer.add_event(0, on(99)));
        assert_eq!(buffer.capacity(), capacity);

        buffer.clear();
        assert!(buffer.is_empty());
    }
}
