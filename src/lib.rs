//! Ding Dong: an HTTP responder for load tests.
//!
//! Every request is answered with `200 OK` straight away. Request bodies are
//! handed to a bounded queue and tallied by a pool of worker tasks; when the
//! queue is full the body is dropped and counted instead of delaying the
//! reply. On SIGINT/SIGTERM the listener stops, the queue drains and a
//! summary is printed.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod metrics;
pub mod queue;
pub mod server;
pub mod workers;

pub use config::Config;
pub use error::{Result, ServerError};
pub use lifecycle::{run, serve, Phase};
pub use metrics::{MetricsSnapshot, MetricsStore, ReportFormat};
pub use queue::{PushOutcome, QueuedBody, WorkQueue};
pub use workers::WorkerPool;

/// Shared state handed to the intake handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Counters read once at shutdown.
    pub metrics: Arc<MetricsStore>,

    /// Bodies waiting for a worker.
    pub queue: Arc<WorkQueue>,
}

impl AppState {
    /// Fresh counters and an open queue of the given capacity.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            metrics: Arc::new(MetricsStore::new()),
            queue: Arc::new(WorkQueue::new(queue_capacity)),
        }
    }
}
