//! Application setup and server configuration.

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::kernel::EventStore;
use crate::server::error::ApiError;
use crate::server::routes::{
    create_batch_handler, create_event_handler, docs_handler, health_handler, openapi_handler,
};

/// Body limit for a single event.
pub const SINGLE_BODY_LIMIT: usize = 1 << 20;
/// Body limit for a batch.
pub const BATCH_BODY_LIMIT: usize = 5 << 20;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: EventStore,
    /// Cancelled on shutdown; writes run under child tokens.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(store: EventStore) -> Self {
        Self {
            store,
            shutdown: CancellationToken::new(),
        }
    }
}

/// Build the Axum application router
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route(
            "/events",
            post(create_event_handler).layer(DefaultBodyLimit::max(SINGLE_BODY_LIMIT)),
        )
        .route(
            "/events/batch",
            post(create_batch_handler).layer(DefaultBodyLimit::max(BATCH_BODY_LIMIT)),
        )
        .route("/healthz", get(health_handler))
        .route("/openapi.yaml", get(openapi_handler))
        .route("/docs", get(docs_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

/// The request outlived `request_timeout`. Its handler future has already
/// been dropped, so any uncommitted write is rolled back.
async fn handle_timeout_error(_err: tower::BoxError) -> ApiError {
    ApiError::timeout()
}
