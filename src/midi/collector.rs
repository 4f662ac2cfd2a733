use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use super::buffer::MidiBuffer;
use crate::clock::Clock;
use crate::types::events::MidiEvent;

/// Tuning for the event collector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectorConfig {
    /// Maximum number of queued events; producers never block, overflow is dropped
    pub capacity: usize,
    /// Seconds the render window trails the clock
    pub latency: f64,
    /// Events stamped this far (seconds) before the window still play, at the
    /// start of the block; anything older is stale
    pub late_tolerance: f64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            latency: 0.0,
            late_tolerance: 0.05,
        }
    }
}

/// Counters kept by the consumer side; reading them never blocks the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    pub delivered: u64,
    /// Events stamped further behind the window than the late tolerance
    pub dropped_stale: u64,
    /// Due events that did not fit in the block buffer
    pub dropped_overflow: u64,
}

/// Create the producer and consumer halves of one collector
pub fn midi_collector(config: CollectorConfig, clock: Arc<dyn Clock>) -> (EventSender, MidiCollector) {
    let capacity = config.capacity.max(1);
    let (tx, rx) = bounded(capacity);

    let sender = EventSender { tx };
    let collector = MidiCollector {
        rx,
        pending: Vec::with_capacity(capacity),
        clock,
        config,
        sample_rate: 0.0,
        window_start: 0.0,
        stats: CollectorStats::default(),
    };

    (sender, collector)
}

/// Producer half. Cloneable; usable from any thread.
#[derive(Clone)]
pub struct EventSender {
    tx: Sender<MidiEvent>,
}

impl EventSender {
    /// Non-blocking enqueue. Returns false if the queue is full or the
    /// consumer is gone.
    pub fn add_message_to_queue(&self, event: MidiEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::debug!(target: "collector", "queue full, dropping {event:?}");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Consumer half, owned by the render context.
///
/// Each drain covers the clock time since the previous drain, so whatever
/// arrived between two audio callbacks plays in the next block. The span is
/// laid into the tail of the block, or squeezed into it when more than one
/// block of time has passed.
pub struct MidiCollector {
    rx: Receiver<MidiEvent>,
    /// Events pulled off the queue that are not due yet
    pending: Vec<MidiEvent>,
    clock: Arc<dyn Clock>,
    config: CollectorConfig,
    sample_rate: f64,
    /// Clock time the previous drain ended at
    window_start: f64,
    stats: CollectorStats,
}

impl MidiCollector {
    /// Start tracking time at `sample_rate` from now. Anything queued before
    /// this point is discarded.
    pub fn reset(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.window_start = self.clock.now() - self.config.latency;
        self.pending.clear();
        while self.rx.try_recv().is_ok() {}
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Clock time the next drain starts from
    pub fn window_start(&self) -> f64 {
        self.window_start
    }

    pub fn stats(&self) -> CollectorStats {
        self.stats
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Move every event stamped up to and including now (less latency) into
    /// `dest`, with offsets in `[0, num_samples)` in timestamp order. An event
    /// stamped exactly at the window end lands on the last sample. Later events stay
    /// queued; events older than the window by more than the late tolerance
    /// are dropped as stale.
    pub fn remove_next_block_of_messages(&mut self, dest: &mut MidiBuffer, num_samples: usize) {
        dest.clear();
        if num_samples == 0 || self.sample_rate <= 0.0 {
            return;
        }

        let start = self.window_start;
        // A clock stepping backwards yields an empty window, never a negative one
        let end = (self.clock.now() - self.config.latency).max(start);
        self.window_start = end;

        while self.pending.len() < self.pending.capacity() {
            match self.rx.try_recv() {
                Ok(event) => self.pending.push(event),
                Err(_) => break,
            }
        }

        let sample_rate = self.sample_rate;
        let block = num_samples as f64;
        let window = (end - start) * sample_rate;
        let (lead, scale) = if window <= block {
            (block - window, 1.0)
        } else {
            (0.0, block / window)
        };
        let oldest = start - self.config.late_tolerance;
        let last = num_samples - 1;
        let stats = &mut self.stats;

        self.pending.retain(|event| {
            let timestamp = event.timestamp();
            if timestamp > end {
                return true;
            }
            if timestamp < oldest {
                stats.dropped_stale += 1;
                return false;
            }

            let position = lead + (timestamp - start).max(0.0) * sample_rate * scale;
            let offset = (position.round() as usize).min(last);
            if dest.add_event(offset, *event) {
                stats.delivered += 1;
            } else {
                stats.dropped_overflow += 1;
            }
            false
        });
    }
}
