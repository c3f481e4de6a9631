//! Bounded priority queue with blocking enqueue/dequeue and close semantics
//!
//! All state lives behind a single mutex. Every operation performs its whole
//! state transition (buffer mutation, producer admission, consumer hand-off)
//! inside one critical section, so the buffer and the two waiting lists are
//! never observed out of step. Suspended callers are represented by oneshot
//! channels stored in FIFO order.

use crate::core::sync::{lock_or_error, lock_or_recover};
use crate::queue::entry::QueueEntry;
use crate::queue::error::{QueueError, QueueResult};
use crate::queue::types::{QueueStats, DEFAULT_PRIORITY};
use futures::stream::{self, Stream};
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard};
use std::task::{ready, Context, Poll};
use tokio::sync::oneshot;

/// Enqueue request parked until a buffer slot frees up
struct PendingEnqueue<T> {
    item: T,
    priority: i32,
    ack: oneshot::Sender<bool>,
}

impl<T> PendingEnqueue<T> {
    /// The caller dropped its enqueue future and no longer awaits the outcome
    fn is_withdrawn(&self) -> bool {
        self.ack.is_closed()
    }

    fn resolve(self, accepted: bool) -> T {
        let _ = self.ack.send(accepted);
        self.item
    }
}

struct QueueState<T> {
    buffer: BinaryHeap<QueueEntry<T>>,
    /// Accepted items bounced back by cancelled dequeues while the buffer
    /// was full or closed; served before the buffer and kept across close()
    restored: VecDeque<QueueEntry<T>>,
    next_sequence: u64,
    waiting_consumers: VecDeque<oneshot::Sender<QueueEntry<T>>>,
    waiting_producers: VecDeque<PendingEnqueue<T>>,
    closed: bool,
}

impl<T> QueueState<T> {
    fn new() -> Self {
        Self {
            buffer: BinaryHeap::new(),
            restored: VecDeque::new(),
            next_sequence: 1,
            waiting_consumers: VecDeque::new(),
            waiting_producers: VecDeque::new(),
            closed: false,
        }
    }

    fn assign_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Deliver directly to the earliest live waiting consumer.
    /// Gives the entry back when nobody is waiting.
    fn hand_off(&mut self, mut entry: QueueEntry<T>) -> Result<(), QueueEntry<T>> {
        while let Some(consumer) = self.waiting_consumers.pop_front() {
            match consumer.send(entry) {
                Ok(()) => return Ok(()),
                // Consumer went away before being served
                Err(returned) => entry = returned,
            }
        }
        Err(entry)
    }

    /// Pop the earliest waiting producer that is still interested
    fn next_producer(&mut self) -> Option<PendingEnqueue<T>> {
        while let Some(producer) = self.waiting_producers.pop_front() {
            if producer.is_withdrawn() {
                log::debug!("Discarding item of withdrawn enqueue request");
                continue;
            }
            return Some(producer);
        }
        None
    }

    /// Move one waiting producer into the buffer if there is room for it
    fn admit_producer(&mut self, capacity: usize) {
        if self.buffer.len() >= capacity {
            return;
        }
        if let Some(producer) = self.next_producer() {
            let priority = producer.priority;
            let sequence = self.assign_sequence();
            let item = producer.resolve(true);
            self.buffer.push(QueueEntry::new(item, priority, sequence));
        }
    }

    fn stats(&self, capacity: usize) -> QueueStats {
        QueueStats {
            capacity,
            buffered: self.buffer.len(),
            restored: self.restored.len(),
            waiting_consumers: self.waiting_consumers.len(),
            waiting_producers: self.waiting_producers.len(),
            closed: self.closed,
            next_sequence: self.next_sequence,
        }
    }
}

/// Outcome of the synchronous half of an enqueue
enum Offer {
    Accepted,
    Rejected,
    Wait(oneshot::Receiver<bool>),
}

/// Outcome of the synchronous half of a dequeue
enum Take<T> {
    Item(T),
    Closed,
    Wait(oneshot::Receiver<QueueEntry<T>>),
}

/// Bounded, priority-ordered, closeable blocking queue
///
/// Producers call [`enqueue`](Self::enqueue) and suspend while the buffer is
/// full; consumers call [`dequeue`](Self::dequeue) and suspend while it is
/// empty. Items come out highest priority first, FIFO among equal priorities.
/// When a consumer is already waiting, an enqueued item is handed to it
/// directly, which makes a capacity of 0 a pure rendezvous channel.
///
/// [`close`](Self::close) releases every waiting caller: waiting producers
/// get `false`, waiting consumers get [`QueueError::Closed`]. Items already
/// buffered stay available until drained.
///
/// # Example
///
/// ```rust
/// use pipeline_queue::queue::BoundedPriorityQueue;
/// use futures::TryStreamExt;
///
/// # async fn example() -> Result<(), pipeline_queue::queue::QueueError> {
/// let queue = BoundedPriorityQueue::new(3);
/// queue.enqueue_with_priority(1, 0).await;
/// queue.enqueue_with_priority(2, 1).await;
/// queue.enqueue_with_priority(3, 0).await;
/// queue.close();
///
/// let drained: Vec<i32> = queue.iterate().try_collect().await?;
/// assert_eq!(drained, vec![2, 1, 3]);
/// # Ok(())
/// # }
/// ```
pub struct BoundedPriorityQueue<T> {
    capacity: usize,
    state: Mutex<QueueState<T>>,
}

impl<T> BoundedPriorityQueue<T> {
    /// Create an open queue holding at most `capacity` buffered items
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(QueueState::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items ready to be dequeued (excludes items held by
    /// waiting producers)
    pub fn len(&self) -> usize {
        let state = self.lock_or_recover();
        state.buffer.len() + state.restored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.lock_or_recover().closed
    }

    pub fn stats(&self) -> QueueStats {
        self.lock_or_recover().stats(self.capacity)
    }

    /// Enqueue `item` with [`DEFAULT_PRIORITY`]
    pub async fn enqueue(&self, item: T) -> bool {
        self.enqueue_with_priority(item, DEFAULT_PRIORITY).await
    }

    /// Enqueue `item`, waiting for a free slot if the buffer is full
    ///
    /// Resolves to `true` once the item is buffered or handed to a consumer,
    /// and to `false` if the queue is (or becomes) closed first. A `false`
    /// result is the signal for a producer to stop producing.
    ///
    /// Dropping the returned future while it waits withdraws the request;
    /// its item is discarded instead of being admitted later.
    pub async fn enqueue_with_priority(&self, item: T, priority: i32) -> bool {
        match self.offer(item, priority) {
            Offer::Accepted => true,
            Offer::Rejected => false,
            // A dropped sender means the request was discarded
            Offer::Wait(ack) => ack.await.unwrap_or(false),
        }
    }

    /// Remove the highest priority item, waiting for one if the queue is empty
    ///
    /// Fails with [`QueueError::Closed`] once the queue is closed and
    /// drained; that is the normal end-of-stream signal for consumers.
    pub async fn dequeue(&self) -> QueueResult<T> {
        match self.take()? {
            Take::Item(item) => Ok(item),
            Take::Closed => Err(QueueError::Closed),
            Take::Wait(receiver) => {
                PendingDequeue {
                    queue: self,
                    receiver: Some(receiver),
                }
                .await
            }
        }
    }

    /// Close the queue. Idempotent.
    ///
    /// Waiting consumers fail with [`QueueError::Closed`], waiting producers
    /// resolve to `false` and their items are dropped. Buffered items remain.
    pub fn close(&self) {
        let mut state = self.lock_or_recover();
        if state.closed {
            log::debug!("Queue already closed");
            return;
        }
        state.closed = true;

        let released_consumers = state.waiting_consumers.len();
        state.waiting_consumers.clear();

        let rejected: Vec<T> = state
            .waiting_producers
            .drain(..)
            .map(|producer| producer.resolve(false))
            .collect();
        let buffered = state.buffer.len() + state.restored.len();
        drop(state);

        log::debug!(
            "Queue closed: {} buffered item(s) left to drain, released {} consumer(s) and {} producer(s)",
            buffered,
            released_consumers,
            rejected.len()
        );
    }

    /// Drain the queue as a stream of items
    ///
    /// Each step is a [`dequeue`](Self::dequeue). The stream ends cleanly
    /// when the queue is closed and empty; any other error is yielded once
    /// and ends the stream. Several streams over one queue compete for items.
    pub fn iterate(&self) -> impl Stream<Item = QueueResult<T>> + '_ {
        stream::unfold(Some(self), |queue| async move {
            let queue = queue?;
            match queue.dequeue().await {
                Ok(item) => Some((Ok(item), Some(queue))),
                Err(error) if error.is_closed() => None,
                Err(error) => Some((Err(error), None)),
            }
        })
    }

    fn offer(&self, item: T, priority: i32) -> Offer {
        let mut state = match self.lock_state() {
            Ok(state) => state,
            Err(e) => {
                log::error!("Rejecting enqueue: {}", e);
                return Offer::Rejected;
            }
        };

        if state.closed {
            log::debug!("Rejecting enqueue on closed queue");
            return Offer::Rejected;
        }

        let sequence = state.assign_sequence();
        let entry = match state.hand_off(QueueEntry::new(item, priority, sequence)) {
            Ok(()) => {
                log::trace!("Handed item #{} directly to a waiting consumer", sequence);
                return Offer::Accepted;
            }
            Err(entry) => entry,
        };

        if state.buffer.len() < self.capacity {
            state.buffer.push(entry);
            return Offer::Accepted;
        }

        let (ack, receiver) = oneshot::channel();
        state.waiting_producers.push_back(PendingEnqueue {
            item: entry.item,
            priority,
            ack,
        });
        log::trace!(
            "Buffer full ({}), {} producer(s) waiting",
            self.capacity,
            state.waiting_producers.len()
        );
        Offer::Wait(receiver)
    }

    fn take(&self) -> QueueResult<Take<T>> {
        let mut state = self.lock_state()?;

        if let Some(entry) = state.restored.pop_front() {
            return Ok(Take::Item(entry.item));
        }

        if let Some(entry) = state.buffer.pop() {
            state.admit_producer(self.capacity);
            return Ok(Take::Item(entry.item));
        }

        // Only reachable at capacity 0: meet the producer directly
        if let Some(producer) = state.next_producer() {
            return Ok(Take::Item(producer.resolve(true)));
        }

        if state.closed {
            return Ok(Take::Closed);
        }

        let (consumer, receiver) = oneshot::channel();
        state.waiting_consumers.push_back(consumer);
        Ok(Take::Wait(receiver))
    }

    /// Put back an item that was handed to a dequeue which was dropped
    /// before it could return it
    ///
    /// The item was already accepted, so it is never rejected: it goes to the
    /// next live consumer, else into the buffer while the queue is open and
    /// has room, else onto the restored list. Nothing is admitted into the
    /// buffer after close().
    fn restore(&self, entry: QueueEntry<T>) {
        let mut state = self.lock_or_recover();
        let entry = match state.hand_off(entry) {
            Ok(()) => return,
            Err(entry) => entry,
        };

        if !state.closed && state.buffer.len() < self.capacity {
            state.buffer.push(entry);
        } else {
            log::trace!("Keeping item #{} on the restored list", entry.sequence);
            state.restored.push_back(entry);
        }
    }

    fn lock_state(&self) -> QueueResult<MutexGuard<'_, QueueState<T>>> {
        lock_or_error(&self.state, |message| QueueError::OperationFailed { message })
    }

    /// Lock for operations that cannot report failure
    fn lock_or_recover(&self) -> MutexGuard<'_, QueueState<T>> {
        lock_or_recover(&self.state, "queue state")
    }
}

impl<T> fmt::Debug for BoundedPriorityQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedPriorityQueue")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Dequeue registered as a waiting consumer
///
/// Dropping it withdraws the request. An item that was already handed to it
/// goes back to the queue instead of being lost.
struct PendingDequeue<'a, T> {
    queue: &'a BoundedPriorityQueue<T>,
    receiver: Option<oneshot::Receiver<QueueEntry<T>>>,
}

impl<T> Future for PendingDequeue<'_, T> {
    type Output = QueueResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Poll::Ready(Err(QueueError::Closed));
        };
        let received = ready!(Pin::new(receiver).poll(cx));
        self.receiver = None;
        // Sender dropped without sending: released by close()
        Poll::Ready(received.map(|entry| entry.item).map_err(|_| QueueError::Closed))
    }
}

impl<T> Drop for PendingDequeue<'_, T> {
    fn drop(&mut self) {
        if let Some(mut receiver) = self.receiver.take() {
            receiver.close();
            if let Ok(entry) = receiver.try_recv() {
                log::debug!("Restoring item #{} from cancelled dequeue", entry.sequence);
                self.queue.restore(entry);
            }
        }
    }
}
