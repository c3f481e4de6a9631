//! Buffered queue entries and their ordering
//!
//! Entries are ordered so that a max-heap pops the highest priority first
//! and, among equal priorities, the lowest (earliest) sequence first.

use std::cmp::Ordering;

/// Item with the priority and admission sequence used for heap ordering
#[derive(Debug)]
pub(crate) struct QueueEntry<T> {
    pub(crate) priority: i32,
    pub(crate) sequence: u64,
    pub(crate) item: T,
}

impl<T> QueueEntry<T> {
    pub(crate) fn new(item: T, priority: i32, sequence: u64) -> Self {
        Self {
            priority,
            sequence,
            item,
        }
    }
}

impl<T> PartialEq for QueueEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl<T> Eq for QueueEntry<T> {}

impl<T> PartialOrd for QueueEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for QueueEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.priority.cmp(&other.priority) {
            // Lower sequence = earlier = greater in the heap
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            ord => ord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn test_higher_priority_pops_first() {
        let mut heap = BinaryHeap::new();
        heap.push(QueueEntry::new("low", 0, 1));
        heap.push(QueueEntry::new("high", 5, 2));
        heap.push(QueueEntry::new("negative", -3, 3));

        assert_eq!(heap.pop().map(|e| e.item), Some("high"));
        assert_eq!(heap.pop().map(|e| e.item), Some("low"));
        assert_eq!(heap.pop().map(|e| e.item), Some("negative"));
    }

    #[test]
    fn test_equal_priority_is_fifo() {
        let mut heap = BinaryHeap::new();
        for sequence in [4, 2, 9, 1] {
            heap.push(QueueEntry::new(sequence, 1, sequence));
        }

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop().map(|e| e.item)).collect();
        assert_eq!(order, vec![1, 2, 4, 9]);
    }
}
