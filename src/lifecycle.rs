//! Startup, shutdown and the final report.
//!
//! The controller walks a fixed sequence of phases:
//!
//! ```text
//! Starting → Running → Draining → Reporting → Terminated
//! ```
//!
//! Draining is entered once the shutdown future resolves and the listener has
//! finished its in-flight requests. The queue is then closed and every worker
//! joined, so the counters are read only after the last mutation.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::metrics::{report, MetricsSnapshot};
use crate::server;
use crate::workers::WorkerPool;
use crate::AppState;

// ─── Phases ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Running,
    Draining,
    Reporting,
    Terminated,
}

impl Phase {
    /// The only phase that may follow this one.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Starting => Some(Phase::Running),
            Phase::Running => Some(Phase::Draining),
            Phase::Draining => Some(Phase::Reporting),
            Phase::Reporting => Some(Phase::Terminated),
            Phase::Terminated => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Starting => "starting",
            Phase::Running => "running",
            Phase::Draining => "draining",
            Phase::Reporting => "reporting",
            Phase::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

// ─── Public entry points ─────────────────────────────────────────

/// Start workers, bind the configured address and serve until `shutdown`
/// resolves. A bind failure is the only error.
pub async fn run<F>(config: Config, shutdown: F) -> Result<MetricsSnapshot>
where
    F: Future<Output = ()> + Send + 'static,
{
    let controller = Controller::start(config);
    let listener = match controller.bind().await {
        Ok(listener) => listener,
        Err(e) => {
            controller.state.queue.close();
            return Err(e);
        }
    };
    Ok(controller.serve(listener, shutdown).await)
}

/// Same as [`run`] on an already bound listener.
pub async fn serve<F>(listener: TcpListener, config: Config, shutdown: F) -> MetricsSnapshot
where
    F: Future<Output = ()> + Send + 'static,
{
    Controller::start(config).serve(listener, shutdown).await
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

// ─── Controller ──────────────────────────────────────────────────

/// Owns the shared state and worker pool for one server run.
pub struct Controller {
    config: Config,
    state: Arc<AppState>,
    pool: WorkerPool,
    phase: Phase,
}

impl Controller {
    /// `Starting`: allocate the queue and launch the workers.
    pub fn start(config: Config) -> Self {
        info!(
            workers = config.workers,
            queue_size = config.queue_size,
            max_body_size_mb = config.max_body_size_mb,
            "configuration"
        );

        let state = Arc::new(AppState::new(config.queue_size));
        let pool = WorkerPool::spawn(config.workers, &state.queue, state.metrics.clone());

        Self {
            config,
            state,
            pool,
            phase: Phase::Starting,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.listen_addr();
        TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })
    }

    /// `Running` until `shutdown` resolves, then drain, report and return
    /// the final counters.
    pub async fn serve<F>(mut self, listener: TcpListener, shutdown: F) -> MetricsSnapshot
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = server::create_router(self.state.clone(), self.config.max_body_bytes());
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "starting server");
        }
        self.advance(Phase::Running);

        let served = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        // ── Draining ────────────────────────────────────────────
        self.advance(Phase::Draining);
        if let Err(e) = served {
            warn!(error = %ServerError::Serve(e), "listener did not shut down cleanly");
        }

        self.state.queue.close();
        let backlog = self.state.queue.len();
        let consumed = std::mem::take(&mut self.pool).join().await;
        info!(backlog, consumed, "workers drained");

        // ── Reporting ───────────────────────────────────────────
        self.advance(Phase::Reporting);
        let snapshot = self.state.metrics.snapshot();
        let rendered = report::render(&snapshot, self.config.report);
        println!("{}", rendered.trim_end());

        self.advance(Phase::Terminated);
        snapshot
    }

    fn advance(&mut self, to: Phase) {
        debug_assert_eq!(self.phase.next(), Some(to), "out-of-order phase");
        info!(from = %self.phase, to = %to, "lifecycle");
        self.phase = to;
    }
}
