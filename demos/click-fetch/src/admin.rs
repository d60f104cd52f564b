//! Optional HTTP endpoint exposing health, the current snapshot and metrics.
//!
//! ```text
//! GET /health    liveness
//! GET /ready     store health (503 while shutting down)
//! GET /snapshot  current snapshot as JSON
//! GET /metrics   Prometheus text (503 unless the recorder is installed)
//! ```

use crate::state::AppSnapshot;
use crate::AppStore;
use axum::extract::{FromRef, State};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tally_runtime::metrics::MetricsRecorder;
use tally_web::handlers::{health_check, not_found, readiness};
use tally_web::{AppError, WebResult};

/// State shared by the admin handlers.
#[derive(Clone, FromRef)]
pub struct AdminState {
    /// The app store
    pub store: AppStore,
    /// Recorder whose output `/metrics` serves
    pub metrics: Arc<MetricsRecorder>,
}

/// Build the admin router.
pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness::<AppStore>))
        .route("/snapshot", get(snapshot))
        .route("/metrics", get(metrics))
        .fallback(not_found)
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn snapshot(State(store): State<AppStore>) -> Json<AppSnapshot> {
    Json(AppSnapshot::clone(&store.snapshot()))
}

#[allow(clippy::unused_async)]
async fn metrics(State(recorder): State<Arc<MetricsRecorder>>) -> WebResult<String> {
    recorder
        .render()
        .ok_or_else(|| AppError::unavailable("Metrics recorder is not installed"))
}
