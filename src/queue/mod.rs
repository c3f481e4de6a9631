//! Bounded Priority Queue Component
//!
//! The concurrency core between message readers and dispatch workers: a
//! typed, capacity-bounded, priority-ordered, closeable blocking queue.
//!
//! # Overview
//!
//! - **Backpressure**: producers suspend while the buffer is full
//! - **Priority ordering**: higher priority first, FIFO among equal priorities
//! - **Hand-off**: an item goes straight to an already waiting consumer,
//!   so a capacity of 0 works as a rendezvous channel
//! - **Fairness**: waiting consumers and waiting producers are served FIFO
//! - **Shutdown**: `close()` releases everyone; buffered items stay drainable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Reader A   │     │   Reader B   │     │   Reader C   │
//! └──────┬───────┘     └──────┬───────┘     └──────┬───────┘
//!        │ enqueue(item, priority)                 │
//!        ▼                    ▼                    ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                BoundedPriorityQueue<T>                  │
//! │  waiting producers ──► ┌───┬───┬───┐ ◄── capacity       │
//! │                        │ 9 │ 5 │ 5 │  (priority, seq)   │
//! │  waiting consumers ◄── └───┴───┴───┘                    │
//! └────────┬───────────────────┬───────────────────┬────────┘
//!          │ dequeue / iterate │                   │
//! ┌────────┴──┐          ┌─────┴────┐        ┌─────┴────┐
//! │ Worker 1  │          │ Worker 2 │        │ Worker 3 │
//! └───────────┘          └──────────┘        └──────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pipeline_queue::queue::BoundedPriorityQueue;
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let queue = Arc::new(BoundedPriorityQueue::new(16));
//!
//! let worker = {
//!     let queue = Arc::clone(&queue);
//!     tokio::spawn(async move {
//!         let mut items = std::pin::pin!(queue.iterate());
//!         while let Some(Ok(message)) = items.next().await {
//!             println!("Dispatching: {}", message);
//!         }
//!     })
//! };
//!
//! for message in ["a", "b", "c"] {
//!     if !queue.enqueue(message.to_string()).await {
//!         break; // closed
//!     }
//! }
//! queue.close();
//! let _ = worker.await;
//! # }
//! ```

pub mod api;
mod bounded;
mod entry;
mod error;
mod types;

pub use bounded::BoundedPriorityQueue;
pub use error::{QueueError, QueueResult};
pub use types::{QueueStats, DEFAULT_PRIORITY};

#[cfg(test)]
mod tests;
