//! Public API for the queue system
//!
//! External modules should import from here rather than directly from internal modules.
//! See module documentation for complete usage examples and architecture details.

// Core queue
pub use crate::queue::bounded::BoundedPriorityQueue;

// Error handling
pub use crate::queue::error::{QueueError, QueueResult};

// Type definitions and statistics
pub use crate::queue::types::{QueueStats, DEFAULT_PRIORITY};
