use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers;
use crate::AppState;

/// Builds the `Router`: a single fallback answering every method and path.
///
/// Bodies larger than `max_body_bytes` are refused with 413 before the
/// intake handler runs.
pub fn create_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .fallback(handlers::intake)
        // ── Provide shared state to the intake ──────────────────
        .with_state(state)
        // ── Body size limit (tower-http replaces axum's 2 MB default)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
}
