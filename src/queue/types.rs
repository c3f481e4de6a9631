//! Queue type definitions and statistics

/// Priority used by [`BoundedPriorityQueue::enqueue`](crate::queue::BoundedPriorityQueue::enqueue)
pub const DEFAULT_PRIORITY: i32 = 0;

/// Point-in-time snapshot of a queue, taken under its state lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStats {
    /// Fixed buffer capacity
    pub capacity: usize,
    /// Number of items currently buffered
    pub buffered: usize,
    /// Items returned by cancelled dequeues and held outside the buffer
    pub restored: usize,
    /// Registered dequeue requests still waiting for an item
    pub waiting_consumers: usize,
    /// Registered enqueue requests still waiting for a free slot
    pub waiting_producers: usize,
    /// Whether close() has been called
    pub closed: bool,
    /// Next sequence number to be assigned on admission
    pub next_sequence: u64,
}
