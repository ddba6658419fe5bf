//! Event intake endpoints.
//!
//! - `POST /events`: one event, answered with `{id, receivedAt}`
//! - `POST /events/batch`: a JSON array, answered with `{count, ids}`
//!
//! Each write runs under a child of the server's shutdown token, so writes
//! still in flight when the server stops are abandoned and rolled back.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::common::EventId;
use crate::domains::events::{ingest_batch, ingest_event, CandidateEvent, Receipt};
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::server::extract::JsonBody;

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub count: usize,
    pub ids: Vec<EventId>,
}

pub async fn create_event_handler(
    State(state): State<AppState>,
    JsonBody(candidate): JsonBody<CandidateEvent>,
) -> Result<(StatusCode, Json<Receipt>), ApiError> {
    let cancel = state.shutdown.child_token();
    let receipt = ingest_event(&candidate, &state.store, &cancel).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn create_batch_handler(
    State(state): State<AppState>,
    JsonBody(candidates): JsonBody<Vec<CandidateEvent>>,
) -> Result<(StatusCode, Json<BatchResponse>), ApiError> {
    let cancel = state.shutdown.child_token();
    let receipt = ingest_batch(&candidates, &state.store, &cancel).await?;
    Ok((
        StatusCode::CREATED,
        Json(BatchResponse {
            count: receipt.count(),
            ids: receipt.ids,
        }),
    ))
}
