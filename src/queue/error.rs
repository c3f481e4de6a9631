//! Queue Error Types

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum QueueError {
    /// The queue is closed and holds no more items
    #[error("Queue is closed")]
    Closed,

    #[error("Operation failed: {message}")]
    OperationFailed { message: String },
}

impl QueueError {
    /// True for the end-of-stream signal rather than a real failure
    pub fn is_closed(&self) -> bool {
        matches!(self, QueueError::Closed)
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
