use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::info;

use crate::metrics::RESOLUTIONS_TOTAL;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
}

/// The hot path: resolve `q` and answer with a 302.
///
/// Resolution never fails from the client's point of view; worst case the
/// redirect points at the configured home URL.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
    headers: HeaderMap,
) -> Response {
    let host = request_host(&headers, &state);

    info!(query = %params.q, "search request");
    let location = state.resolver().resolve(&params.q, &host).await;

    let outcome = if location == state.resolver().home_url() {
        "home"
    } else {
        "redirect"
    };
    RESOLUTIONS_TOTAL.with_label_values(&[outcome]).inc();

    found(&location)
}

/// A 302 with `Location` set and no body.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// The Host header of the incoming request, for internal-endpoint
/// redirects. Falls back to the first configured host.
fn request_host(headers: &HeaderMap, state: &AppState) -> String {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| state.config().resolver.allowed_hosts.first().cloned())
        .unwrap_or_default()
}
