//! Admin and health endpoint tests.

mod common;

use axum::http::StatusCode;
use common::TestFixture;

#[tokio::test]
async fn healthz_reports_status_and_uptime() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/healthz").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert!(response.body["uptime_seconds"].is_number());
    assert!(response.body["version"].is_string());
}

#[tokio::test]
async fn readyz_reports_ready() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/readyz").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["ready"], true);
}

#[tokio::test]
async fn reload_accepts_then_coalesces() {
    let fixture = TestFixture::new().await;

    // First request claims both trigger slots.
    let first = fixture.post("/reload").await;
    assert_eq!(first.status, StatusCode::ACCEPTED);

    // Nothing drains the channels in this fixture, so a second request
    // finds both slots occupied.
    let second = fixture.post("/reload").await;
    assert_eq!(second.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn infra_reports_intelligent_when_everything_is_up() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/infra").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["routing_mode"], "intelligent");
    assert_eq!(response.body["components"]["catalog"]["ok"], true);
    assert_eq!(response.body["components"]["cache"]["ok"], true);
    assert_eq!(
        response.body["components"]["catalog"]["services_loaded"],
        5
    );
}

#[tokio::test]
async fn infra_degrades_when_the_cache_is_down() {
    let fixture = TestFixture::new().await;
    fixture.store.set_unavailable(true);

    let response = fixture.get("/infra").await;
    assert_eq!(response.body["routing_mode"], "degraded");
    assert_eq!(response.body["components"]["cache"]["ok"], false);
}

#[tokio::test]
async fn infra_is_critical_without_services() {
    let fixture = TestFixture::empty().await;
    let response = fixture.get("/infra").await;

    assert_eq!(response.body["routing_mode"], "critical");
    assert_eq!(response.body["components"]["catalog"]["ok"], false);
}

#[tokio::test]
async fn metrics_exposition_is_served() {
    let fixture = TestFixture::new().await;
    // Generate at least one observation first.
    fixture.get("/search?q=jellyfin").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
}
