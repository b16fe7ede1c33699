//! Health Endpoints
//!
//! - `GET /api/health`: liveness. Always 200 while the process serves requests.
//! - `GET /api/health/ready`: readiness. Pings the user store and answers
//!   503 when it is unreachable, so load balancers stop routing logins to
//!   an instance that cannot check credentials.
//!
//! Both live under `/api`, which the route guard never redirects.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::routes;
use crate::store::UserStore;

/// Readiness gives up on the store after this long
const READY_TIMEOUT: Duration = Duration::from_secs(2);

/// JSON response for health endpoints
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", "ready" or "not_ready"
    pub status: &'static str,

    /// Store round-trip time, readiness only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Router with the liveness and readiness endpoints
pub fn health_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Arc<dyn UserStore>: FromRef<S>,
{
    Router::new()
        .route(routes::API_HEALTH, get(live_handler))
        .route(routes::API_HEALTH_READY, get(ready_handler))
}

async fn live_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        duration_ms: None,
    })
}

async fn ready_handler(State(store): State<Arc<dyn UserStore>>) -> Response {
    let start = Instant::now();
    let outcome = tokio::time::timeout(READY_TIMEOUT, store.ping()).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let ready = match outcome {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Readiness check failed");
            false
        }
        Err(_) => {
            tracing::warn!(timeout_ms = READY_TIMEOUT.as_millis() as u64, "Readiness check timed out");
            false
        }
    };

    let (status_code, status) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not_ready")
    };

    tracing::debug!(status, duration_ms, "Readiness probe completed");

    (
        status_code,
        Json(HealthResponse {
            status,
            duration_ms: Some(duration_ms),
        }),
    )
        .into_response()
}
