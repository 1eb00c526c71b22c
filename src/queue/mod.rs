//! The sequential FIFO job queue: a single in-memory queue of `queued` job
//! IDs plus a single-worker dispatcher. At most one job is `running` at a
//! time per queue instance (spec §4.3).

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::engine::EngineRouter;
use crate::job::JobKind;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue is at capacity ({0} jobs)")]
    Full(usize),
}

struct Entry {
    job_id: Uuid,
    kind: JobKind,
}

/// Never blocks [`enqueue`](JobQueue::enqueue); the dispatcher loop runs as
/// a background task started by [`JobQueue::spawn_dispatcher`].
pub struct JobQueue {
    queue: Mutex<VecDeque<Entry>>,
    notify: Notify,
    is_processing: AtomicBool,
    max_depth: Option<usize>,
}

impl JobQueue {
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            is_processing: AtomicBool::new(false),
            max_depth,
        }
    }

    /// Appends a job ID and wakes the dispatcher if it's idle. Never blocks.
    pub fn enqueue(&self, job_id: Uuid, kind: JobKind) -> Result<(), QueueError> {
        let mut queue = self.queue.lock();
        if let Some(max) = self.max_depth {
            if queue.len() >= max {
                return Err(QueueError::Full(max));
            }
        }
        queue.push_back(Entry { job_id, kind });
        drop(queue);
        self.notify.notify_one();
        Ok(())
    }

    pub fn length(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing.load(Ordering::SeqCst)
    }

    /// Spawns the single-worker dispatch loop: pop head, call
    /// `engine.start_job`, on return pop next. A returned `Err` is logged
    /// and swallowed — the engine is expected to have already transitioned
    /// the job to `failed` via `FailJob` before propagating it.
    pub fn spawn_dispatcher(self: Arc<Self>, router: EngineRouter) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let next = {
                    let mut queue = self.queue.lock();
                    queue.pop_front()
                };

                let Some(Entry { job_id, kind }) = next else {
                    self.is_processing.store(false, Ordering::SeqCst);
                    self.notify.notified().await;
                    continue;
                };

                self.is_processing.store(true, Ordering::SeqCst);
                let engine = router.for_kind(kind);
                if let Err(err) = engine.start_job(job_id).await {
                    tracing::error!(%job_id, error = %err, "job run returned an error after failing the job");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_never_blocks_and_respects_max_depth() {
        let queue = JobQueue::new(Some(2));
        queue.enqueue(Uuid::new_v4(), JobKind::Crawl).unwrap();
        queue.enqueue(Uuid::new_v4(), JobKind::Crawl).unwrap();
        let err = queue.enqueue(Uuid::new_v4(), JobKind::Crawl).unwrap_err();
        assert!(matches!(err, QueueError::Full(2)));
        assert_eq!(queue.length(), 2);
    }

    #[test]
    fn unbounded_queue_accepts_any_depth() {
        let queue = JobQueue::new(None);
        for _ in 0..500 {
            queue.enqueue(Uuid::new_v4(), JobKind::Crawl).unwrap();
        }
        assert_eq!(queue.length(), 500);
    }
}
