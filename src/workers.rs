use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::metrics::MetricsStore;
use crate::queue::{QueuedBody, WorkQueue};

/// Fixed set of tasks folding queued bodies into `total_body_size`.
#[derive(Default)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<u64>>,
}

// ─── Public entry point ──────────────────────────────────────────

impl WorkerPool {
    /// Spawns `count` Tokio tasks that consume `queue` until it is closed
    /// and empty. `count == 0` is allowed; the queue then only fills up.
    pub fn spawn(count: usize, queue: &WorkQueue, metrics: Arc<MetricsStore>) -> Self {
        let handles = (0..count)
            .map(|worker_id| {
                let rx = queue.consumer();
                let metrics = metrics.clone();
                tokio::spawn(worker(worker_id, rx, metrics))
            })
            .collect();

        Self { handles }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every worker to exit and return how many bodies they
    /// consumed in total. Only returns once the queue has been closed.
    pub async fn join(self) -> u64 {
        let mut consumed = 0;
        for (worker_id, handle) in self.handles.into_iter().enumerate() {
            match handle.await {
                Ok(n) => consumed += n,
                Err(e) => tracing::warn!(worker_id, error = %e, "worker task failed"),
            }
        }
        consumed
    }
}

// ─── Worker loop ─────────────────────────────────────────────────

async fn worker(
    id: usize,
    rx: flume::Receiver<QueuedBody>,
    metrics: Arc<MetricsStore>,
) -> u64 {
    let mut consumed = 0u64;

    // Err only once every sender is gone and the buffer is empty
    while let Ok(item) = rx.recv_async().await {
        metrics.record_consumed_body(item.len());
        consumed += 1;
    }

    tracing::debug!(worker_id = id, consumed, "worker drained");
    consumed
}
