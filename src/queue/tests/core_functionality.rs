//! Core functionality tests for enqueue, dequeue and priority ordering

#[cfg(test)]
mod tests {
    use crate::queue::api::{BoundedPriorityQueue, QueueError, DEFAULT_PRIORITY};
    use crate::queue::tests::{wait_until, BLOCKED_FOR};
    use futures::TryStreamExt;
    use std::sync::Arc;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_enqueue_blocks_when_capacity_reached() {
        let queue = BoundedPriorityQueue::new(3);

        assert!(queue.enqueue(1).await);
        assert!(queue.enqueue(2).await);
        assert!(queue.enqueue(3).await);

        let blocked = timeout(BLOCKED_FOR, queue.enqueue(4)).await;
        assert!(blocked.is_err(), "4th enqueue should wait for a free slot");
        assert_eq!(queue.len(), 3);
    }

    #[tokio::test]
    async fn test_dequeue_blocks_when_empty() {
        let queue = BoundedPriorityQueue::<i32>::new(3);

        let blocked = timeout(BLOCKED_FOR, queue.dequeue()).await;
        assert!(blocked.is_err(), "dequeue on an empty open queue should wait");
    }

    #[tokio::test]
    async fn test_dequeue_resolves_after_item_added() {
        let queue = Arc::new(BoundedPriorityQueue::new(3));

        let pending = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.dequeue().await })
        };
        wait_until(&queue, |s| s.waiting_consumers == 1).await;

        assert!(queue.enqueue(42).await);
        assert_eq!(pending.await.unwrap(), Ok(42));
        assert!(queue.is_empty(), "hand-off should bypass the buffer");
    }

    #[tokio::test]
    async fn test_blocked_enqueue_completes_after_dequeue() {
        let queue = Arc::new(BoundedPriorityQueue::new(3));
        for i in 1..=3 {
            assert!(queue.enqueue(i).await);
        }

        let pending = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.enqueue(4).await })
        };
        wait_until(&queue, |s| s.waiting_producers == 1).await;

        for expected in 1..=4 {
            assert_eq!(queue.dequeue().await, Ok(expected));
        }

        assert!(pending.await.unwrap(), "blocked enqueue should be admitted");
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_dequeues_higher_priority_first() {
        let queue = BoundedPriorityQueue::new(3);
        queue.enqueue_with_priority(1, 0).await;
        queue.enqueue_with_priority(2, 1).await;
        queue.enqueue_with_priority(3, 0).await;

        assert_eq!(queue.dequeue().await, Ok(2));
        assert_eq!(queue.dequeue().await, Ok(1));
        assert_eq!(queue.dequeue().await, Ok(3));
    }

    #[tokio::test]
    async fn test_negative_and_default_priorities() {
        let queue = BoundedPriorityQueue::new(8);
        queue.enqueue_with_priority("background", -5).await;
        queue.enqueue("normal-a").await;
        queue.enqueue_with_priority("urgent", 10).await;
        queue.enqueue_with_priority("normal-b", DEFAULT_PRIORITY).await;

        let drained: Vec<&str> = {
            queue.close();
            queue.iterate().try_collect().await.unwrap()
        };
        assert_eq!(drained, vec!["urgent", "normal-a", "normal-b", "background"]);
    }

    #[tokio::test]
    async fn test_admitted_producer_keeps_priority() {
        let queue = Arc::new(BoundedPriorityQueue::new(2));
        queue.enqueue_with_priority("low-1", 0).await;
        queue.enqueue_with_priority("low-2", 0).await;

        let pending = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.enqueue_with_priority("high", 9).await })
        };
        wait_until(&queue, |s| s.waiting_producers == 1).await;

        // Freeing one slot admits "high", which then overtakes "low-2"
        assert_eq!(queue.dequeue().await, Ok("low-1"));
        assert!(pending.await.unwrap());
        assert_eq!(queue.dequeue().await, Ok("high"));
        assert_eq!(queue.dequeue().await, Ok("low-2"));
    }

    #[tokio::test]
    async fn test_iterate_yields_contained_items() {
        let queue = BoundedPriorityQueue::new(3);
        queue.enqueue_with_priority(1, 0).await;
        queue.enqueue_with_priority(2, 1).await;
        queue.enqueue_with_priority(3, 0).await;
        queue.close();

        let buffer: Vec<i32> = queue.iterate().try_collect().await.unwrap();
        assert_eq!(buffer, vec![2, 1, 3]);
        assert_eq!(queue.dequeue().await, Err(QueueError::Closed));
    }

    #[tokio::test]
    async fn test_iterate_terminates_without_items() {
        let queue = Arc::new(BoundedPriorityQueue::<i32>::new(3));

        let draining = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                let items: Vec<i32> = queue.iterate().try_collect().await?;
                Ok::<_, QueueError>(items.len())
            })
        };
        wait_until(&queue, |s| s.waiting_consumers == 1).await;
        queue.close();

        assert_eq!(draining.await.unwrap(), Ok(0));
    }

    #[tokio::test]
    async fn test_sequence_numbers_increase() {
        let queue = BoundedPriorityQueue::new(4);
        assert_eq!(queue.stats().next_sequence, 1);

        queue.enqueue("a").await;
        queue.enqueue("b").await;
        let stats = queue.stats();
        assert_eq!(stats.next_sequence, 3);
        assert_eq!(stats.buffered, 2);
        assert_eq!(stats.capacity, 4);
        assert!(!stats.closed);
    }
}
