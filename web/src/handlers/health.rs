//! Liveness and readiness endpoints.

use axum::{extract::State, http::StatusCode, Json};
use tally_core::reducer::Reducer;
use tally_runtime::{HealthCheck, HealthStatus, Store};

/// Anything that can report a [`HealthCheck`] for a readiness probe.
pub trait ReportsHealth {
    /// Current health.
    fn health_report(&self) -> HealthCheck;
}

impl<S, A, E, R> ReportsHealth for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
    A: Send + Clone + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn health_report(&self) -> HealthCheck {
        self.health()
    }
}

/// Liveness: `200 ok` while the process serves requests.
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness: the [`HealthCheck`] of `H` as JSON.
///
/// Healthy and degraded answer 200, unhealthy answers 503. For a store that
/// means 503 from the moment shutdown begins.
///
/// ```text
/// GET /ready
/// {"component":"store","status":"Healthy","message":null,
///  "metadata":[["pending_effects","0"],["cancellable_in_flight","0"]]}
/// ```
#[allow(clippy::unused_async)]
pub async fn readiness<H>(State(source): State<H>) -> (StatusCode, Json<HealthCheck>)
where
    H: ReportsHealth + Clone + Send + Sync + 'static,
{
    let report = source.health_report();
    if report.status == HealthStatus::Unhealthy {
        tracing::debug!(component = %report.component, "Readiness probe failed");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(report));
    }
    (StatusCode::OK, Json(report))
}
