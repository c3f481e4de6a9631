//! Test modules for the bounded priority queue
//!
//! Tests are organized by functional area for better maintainability.

use crate::queue::api::{BoundedPriorityQueue, QueueStats};
use std::time::Duration;

mod core_functionality;

/// How long a blocked operation is given to (wrongly) resolve
const BLOCKED_FOR: Duration = Duration::from_millis(50);

/// Yield until the queue state satisfies `predicate`, so that spawned
/// producers/consumers have registered before the test continues
async fn wait_until<T>(queue: &BoundedPriorityQueue<T>, predicate: impl Fn(&QueueStats) -> bool) {
    let settled = tokio::time::timeout(Duration::from_secs(5), async {
        while !predicate(&queue.stats()) {
            tokio::task::yield_now().await;
        }
    })
    .await;
    assert!(settled.is_ok(), "queue never reached expected state: {:?}", queue.stats());
}
