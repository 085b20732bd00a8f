//! Health check endpoint handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

/// Simple status response for liveness/readiness probes.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_latency_ms: Option<u64>,
}

/// Liveness probe endpoint.
///
/// Returns 200 OK if the process is running.
pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "alive".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database_latency_ms: None,
    })
}

/// Readiness probe endpoint.
///
/// Returns 503 when the database does not answer. Without a database (the
/// in-memory store) the service is always ready.
pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    let Some(pool) = state.pool.as_ref() else {
        return Ok(Json(StatusResponse {
            status: "ready".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database_latency_ms: None,
        }));
    };

    let start = std::time::Instant::now();
    let db_connected = persistence::db::ping(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    persistence::metrics::record_pool_metrics(pool);

    if db_connected {
        Ok(Json(StatusResponse {
            status: "ready".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database_latency_ms: Some(latency_ms),
        }))
    } else {
        tracing::warn!("Readiness check failed: database unreachable");
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
