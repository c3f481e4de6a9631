//! Pipeline drill: message readers and dispatch workers around one queue
//!
//! Producers stand in for message readers and enqueue a mix of control and
//! data messages, control messages at a higher priority. Workers share the
//! queue through `iterate()` and exit when it is closed and drained. The
//! queue is closed once every producer is done, or earlier on a shutdown
//! signal.

use crate::queue::api::{BoundedPriorityQueue, QueueError, QueueResult, DEFAULT_PRIORITY};
use futures::TryStreamExt;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

/// Priority of control-plane messages; data messages use [`DEFAULT_PRIORITY`]
pub const CONTROL_PRIORITY: i32 = DEFAULT_PRIORITY + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Control,
    Data,
}

impl MessageKind {
    pub fn priority(self) -> i32 {
        match self {
            MessageKind::Control => CONTROL_PRIORITY,
            MessageKind::Data => DEFAULT_PRIORITY,
        }
    }
}

/// A message as a reader would hand it to the dispatch layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineMessage {
    pub producer: usize,
    pub sequence: usize,
    pub kind: MessageKind,
}

/// Resolved drill parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillSettings {
    pub capacity: usize,
    pub producers: usize,
    pub workers: usize,
    pub messages_per_producer: usize,
    /// Every Nth message of a producer is a control message; 0 disables them
    pub control_every: usize,
    pub work_delay: Duration,
}

impl Default for DrillSettings {
    fn default() -> Self {
        Self {
            capacity: 64,
            producers: 2,
            workers: 4,
            messages_per_producer: 1000,
            control_every: 10,
            work_delay: Duration::ZERO,
        }
    }
}

/// Outcome of a drill run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrillReport {
    /// Messages accepted by the queue
    pub produced: usize,
    /// Messages producers gave up on because the queue closed
    pub abandoned: usize,
    /// Messages dispatched by workers
    pub consumed: usize,
    pub control: usize,
    pub data: usize,
}

impl DrillReport {
    /// Every message was produced and every produced message dispatched
    pub fn is_complete(&self) -> bool {
        self.abandoned == 0 && self.produced == self.consumed
    }
}

impl fmt::Display for DrillReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "produced {}, abandoned {}, dispatched {} ({} control, {} data)",
            self.produced, self.abandoned, self.consumed, self.control, self.data
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DrillError {
    #[error("Pipeline task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Queue failure: {0}")]
    Queue(#[from] QueueError),
}

#[derive(Debug, Default)]
struct ProducerTally {
    produced: usize,
    abandoned: usize,
}

#[derive(Debug, Default)]
struct WorkerTally {
    control: usize,
    data: usize,
}

/// Run producers and workers to completion
///
/// A message on `shutdown_rx` closes the queue early: producers stop at
/// their next rejected enqueue and workers drain what was already accepted.
pub async fn run_drill(
    settings: &DrillSettings,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<DrillReport, DrillError> {
    let queue = Arc::new(BoundedPriorityQueue::new(settings.capacity));
    log::info!(
        "Starting drill: capacity {}, {} producer(s) x {} message(s), {} worker(s)",
        settings.capacity,
        settings.producers,
        settings.messages_per_producer,
        settings.workers
    );

    let mut workers = JoinSet::new();
    for worker in 0..settings.workers {
        workers.spawn(run_worker(worker, Arc::clone(&queue), settings.work_delay));
    }

    let mut producers = JoinSet::new();
    for producer in 0..settings.producers {
        producers.spawn(run_producer(
            producer,
            Arc::clone(&queue),
            settings.messages_per_producer,
            settings.control_every,
        ));
    }

    let closer = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move {
            if shutdown_rx.recv().await.is_ok() {
                log::warn!("Shutdown requested, closing queue");
                queue.close();
            }
        })
    };

    let mut report = DrillReport::default();
    let joined = join_producers(&mut producers, &queue, &mut report).await;
    log::debug!("All producers finished, closing queue");
    queue.close();
    closer.abort();

    if let Err(e) = joined {
        workers.shutdown().await;
        return Err(e.into());
    }

    while let Some(result) = workers.join_next().await {
        let tally = result??;
        report.control += tally.control;
        report.data += tally.data;
    }
    report.consumed = report.control + report.data;

    log::info!("Drill finished: {}", report);
    Ok(report)
}

/// Wait for every producer, adding their tallies to `report`
///
/// A failed producer closes the queue at once so the others stop instead of
/// blocking on a queue nobody will close; the first failure is returned
/// after all of them have finished.
async fn join_producers(
    producers: &mut JoinSet<ProducerTally>,
    queue: &BoundedPriorityQueue<PipelineMessage>,
    report: &mut DrillReport,
) -> Result<(), tokio::task::JoinError> {
    let mut failure = None;
    while let Some(result) = producers.join_next().await {
        match result {
            Ok(tally) => {
                report.produced += tally.produced;
                report.abandoned += tally.abandoned;
            }
            Err(e) => {
                log::error!("Producer task failed: {}", e);
                queue.close();
                failure.get_or_insert(e);
            }
        }
    }
    failure.map_or(Ok(()), Err)
}

async fn run_producer(
    producer: usize,
    queue: Arc<BoundedPriorityQueue<PipelineMessage>>,
    messages: usize,
    control_every: usize,
) -> ProducerTally {
    let mut tally = ProducerTally::default();

    for sequence in 0..messages {
        let kind = if control_every > 0 && (sequence + 1) % control_every == 0 {
            MessageKind::Control
        } else {
            MessageKind::Data
        };
        let message = PipelineMessage {
            producer,
            sequence,
            kind,
        };

        if !queue.enqueue_with_priority(message, kind.priority()).await {
            tally.abandoned = messages - sequence;
            log::debug!(
                "Producer {} stopping: queue closed, {} message(s) abandoned",
                producer,
                tally.abandoned
            );
            break;
        }
        tally.produced += 1;
    }

    tally
}

async fn run_worker(
    worker: usize,
    queue: Arc<BoundedPriorityQueue<PipelineMessage>>,
    work_delay: Duration,
) -> QueueResult<WorkerTally> {
    let mut tally = WorkerTally::default();
    let mut messages = std::pin::pin!(queue.iterate());

    while let Some(message) = messages.try_next().await? {
        match message.kind {
            MessageKind::Control => tally.control += 1,
            MessageKind::Data => tally.data += 1,
        }
        log::trace!(
            "Worker {} dispatched #{} from producer {}",
            worker,
            message.sequence,
            message.producer
        );
        if !work_delay.is_zero() {
            tokio::time::sleep(work_delay).await;
        }
    }

    log::debug!(
        "Worker {} done: {} control, {} data",
        worker,
        tally.control,
        tally.data
    );
    Ok(tally)
}
