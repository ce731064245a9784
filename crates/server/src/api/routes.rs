use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::{
    middleware,
    routing::{get, post},
    BoxError, Router,
};
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;

use super::{admin, search, system};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let request_timeout = Duration::from_secs(state.config().server.request_timeout_secs);

    Router::new()
        // The hot path
        .route("/search", get(search::search))
        // Admin
        .route("/reload", post(admin::reload))
        .route("/infra", get(admin::infra))
        // Health and observability
        .route("/healthz", get(system::healthz))
        .route("/readyz", get(system::readyz))
        .route("/metrics", get(system::metrics))
        .layer(middleware::from_fn(super::middleware::metrics_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}

async fn handle_timeout(_err: BoxError) -> StatusCode {
    StatusCode::REQUEST_TIMEOUT
}
