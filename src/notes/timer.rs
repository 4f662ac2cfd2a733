use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Identifies one armed timer. A handle is never reused, so a slot can tell a
/// stale fire apart from its current timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct Entry {
    deadline: f64,
    handle: TimerHandle,
    slot: usize,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so the heap pops the earliest deadline first; ties fire in
    // the order they were armed
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .total_cmp(&self.deadline)
            .then_with(|| other.handle.0.cmp(&self.handle.0))
    }
}

/// Deadline queue polled from the control context.
/// Firing only happens inside `pop_due`, so cancelling is always race-free.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Entry>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer for `slot` that becomes due at `deadline` (clock seconds)
    pub fn schedule(&mut self, deadline: f64, slot: usize) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.heap.push(Entry {
            deadline,
            handle,
            slot,
        });
        handle
    }

    /// Returns true if the timer was still pending
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.heap.len();
        self.heap.retain(|entry| entry.handle != handle);
        self.heap.len() != before
    }

    /// Remove and return the earliest timer with `deadline <= now`
    pub fn pop_due(&mut self, now: f64) -> Option<(TimerHandle, usize)> {
        if self.heap.peek()?.deadline > now {
            return None;
        }
        self.heap.pop().map(|entry| (entry.handle, entry.slot))
    }

    /// Deadline of the next timer to fire
    pub fn next_deadline(&self) -> Option<f64> {
        self.heap.peek().map(|entry| entry.deadline)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_deadline_order() {
        let mut timers = TimerQueue::new();
        timers.schedule(3.0, 0);
        timers.schedule(1.0, 1);
        timers.schedule(2.0, 2);

        assert_eq!(timers.next_deadline(), Some(1.0));
        assert!(timers.pop_due(0.5).is_none());

        let fired: Vec<usize> = std::iter::from_fn(|| timers.pop_due(10.0))
            .map(|(_, slot)| slot)
            .collect();
        assert_eq!(fired, vec![1, 2, 0]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_deadline_is_inclusive() {
        let mut timers = TimerQueue::new();
        let handle = timers.schedule(0.5, 7);
        assert_eq!(timers.pop_due(0.5), Some((handle, 7)));
    }

    #[test]
    fn test_cancel_prevents_fire() {
        let mut timers = TimerQueue::new();
        let a = timers.schedule(1.0, 0);
        let b = timers.schedule(1.0, 1);

        assert!(timers.cancel(a));
        assert!(!timers.cancel(a));
        assert_eq!(timers.pop_due(2.0), Some((b, 1)));
        assert_eq!(timers.pop_due(2.0), None);
    }

    #[test]
    fn test_handles_are_unique() {
        let mut timers = TimerQueue::new();
        let a = timers.schedule(1.0, 0);
        timers.clear();
        let b = timers.schedule(1.0, 0);
        assert_ne!(a, b);
    }
}
