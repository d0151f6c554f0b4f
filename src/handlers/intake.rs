use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, Method, StatusCode, Uri},
};
use bytes::Bytes;

use super::dump;
use crate::queue::{PushOutcome, QueuedBody};
use crate::AppState;

// ─── Any method, any path ────────────────────────────────────────

/// Router fallback: always 200 with an empty body.
///
/// Nothing in here awaits, so the reply is never held back by metrics work.
pub async fn intake(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let path = uri.path();
    if dump::wants_dump(path) {
        let remote = connect_info.map(|ConnectInfo(addr)| addr);
        dump::print(&dump::render(method.as_str(), path, remote, &headers, &body));
    }

    record(&state, method.as_str(), &body);

    StatusCode::OK
}

/// Account for one request: hand a non-empty body to the workers (or drop it
/// when the queue is full), then bump the request counters.
///
/// The queued body is a fresh allocation: the extracted `Bytes` may be a
/// slice of the connection's read buffer and must not keep it alive.
///
/// Returns the push outcome, or `None` when there was no body to queue.
pub fn record(state: &AppState, method: &str, body: &[u8]) -> Option<PushOutcome> {
    let outcome = if body.is_empty() {
        None
    } else {
        let copy = Bytes::copy_from_slice(body);
        let outcome = state.queue.try_push(QueuedBody::new(copy, method));
        if outcome == PushOutcome::Full {
            state.metrics.record_dropped_body();
        }
        Some(outcome)
    };

    state.metrics.record_request(method);
    outcome
}
