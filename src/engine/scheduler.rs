use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::types::{MessageKind, Mmsi};

/// The next emission of one (entity, message kind) pair.
///
/// Field order defines the processing order: due time, then entity MMSI, then message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DueEntry {
    /// Virtual time the emission is due
    pub due: Duration,
    pub entity: Mmsi,
    pub kind: MessageKind,
}

/// Min-heap of due entries
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<DueEntry>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, entry: DueEntry) {
        self.queue.push(Reverse(entry));
    }

    /// Remove and return the earliest entry due at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<DueEntry> {
        match self.queue.peek() {
            Some(Reverse(entry)) if entry.due <= now => self.queue.pop().map(|Reverse(entry)| entry),
            _ => None,
        }
    }

    /// Earliest due time, if anything is scheduled
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(entry)| entry.due)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
