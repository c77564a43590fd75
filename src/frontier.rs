use std::{cmp::Ordering, collections::BinaryHeap};

use tracing::warn;

struct Entry<T> {
    priority: u32,
    seq: u64,
    item: T,
}

// `BinaryHeap` pops its greatest element, so "greater" means lower priority, then earlier insert.
impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Entry<T> {}

/// Min-priority queue with first-in-first-out order among equal priorities, so extraction order is
/// reproducible for identical inputs.
///
/// With a capacity set the queue is *approximate*: once it grows past the capacity it keeps only
/// its best 80% and forgets the rest, which can cost a search its optimal answer.
pub struct Frontier<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
    capacity: Option<usize>,
    dropped: usize,
}

impl<T> Default for Frontier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Frontier<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
            capacity: None,
            dropped: 0,
        }
    }

    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new()
        }
    }

    pub fn push(&mut self, priority: u32, item: T) {
        self.heap.push(Entry {
            priority,
            seq: self.next_seq,
            item,
        });
        self.next_seq += 1;

        if let Some(capacity) = self.capacity {
            if self.heap.len() > capacity {
                self.truncate((capacity * 4 / 5).max(1));
            }
        }
    }

    pub fn pop_min(&mut self) -> Option<(u32, T)> {
        self.heap.pop().map(|entry| (entry.priority, entry.item))
    }

    pub fn peek_priority(&self) -> Option<u32> {
        self.heap.peek().map(|entry| entry.priority)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Entries discarded by truncation so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn truncate(&mut self, keep: usize) {
        // Ascending by `Ord`, i.e. worst first.
        let mut entries = std::mem::take(&mut self.heap).into_sorted_vec();
        let excess = entries.len().saturating_sub(keep);
        entries.drain(..excess);
        self.dropped += excess;
        warn!(
            kept = entries.len(),
            dropped = excess,
            "frontier over capacity, discarding worst entries"
        );
        self.heap = BinaryHeap::from(entries);
    }
}
