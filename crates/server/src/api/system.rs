use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthzResponse {
    pub status: String,
    pub uptime_seconds: f64,
    pub version: String,
}

pub async fn healthz(State(state): State<Arc<AppState>>) -> Json<HealthzResponse> {
    Json(HealthzResponse {
        status: "ok".to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
pub struct ReadyzResponse {
    pub ready: bool,
}

pub async fn readyz() -> Json<ReadyzResponse> {
    Json(ReadyzResponse { ready: true })
}

pub async fn metrics() -> String {
    crate::metrics::render()
}
