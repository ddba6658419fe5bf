use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::server::app::AppState;
use crate::server::error::ApiError;

const HEALTH_PING_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Serialize)]
pub struct HealthResponse {
    ok: bool,
}

/// Health check endpoint
///
/// Returns 200 `{"ok": true}` when the store answers within two seconds,
/// 503 `db_unhealthy` otherwise.
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, ApiError> {
    state
        .store
        .ping(HEALTH_PING_TIMEOUT)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Health check failed");
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "db_unhealthy", e.to_string())
        })?;

    Ok(Json(HealthResponse { ok: true }))
}
