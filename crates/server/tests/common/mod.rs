//! Common test utilities for driving the real router in-process.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use jump_core::resolver::ResolverOptions;
use jump_core::source::bookmark_id;
use jump_core::store::CacheStore;
use jump_core::testing::MemoryStore;
use jump_core::{load_config_from_str, Bookmark, MemoryIndex, Prober, Resolver, Service};

use jump_server::api::create_router;
use jump_server::state::AppState;

pub const HOME: &str = "https://home.example.com";

/// In-process server with a seeded index and an in-memory cache store.
///
/// The reload trigger receivers are held (not consumed by real reloaders)
/// so tests can assert the coalescing behavior of the trigger channels.
pub struct TestFixture {
    pub router: Router,
    pub index: Arc<MemoryIndex>,
    pub store: Arc<MemoryStore>,
    _reload_rx: mpsc::Receiver<()>,
    _bookmark_reload_rx: mpsc::Receiver<()>,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Value,
}

pub fn service(hostname: &str, counter: u64) -> Service {
    let mut svc = Service::from_catalog(hostname, Utc::now());
    svc.counter = counter;
    svc
}

pub fn bookmark(abbr: &str, url: &str) -> Bookmark {
    Bookmark {
        id: bookmark_id(url),
        abbr: abbr.to_string(),
        url: url.to_string(),
        sources: vec!["catalog".to_string()],
        created_at: None,
        updated_at: None,
        disabled: false,
    }
}

impl TestFixture {
    /// Build a fixture with the standard scenario catalog.
    pub async fn new() -> Self {
        let fixture = Self::empty().await;
        fixture.index.update_services(vec![
            service("adguard.example.com", 10),
            service("adguard.ha.example.com", 0),
            service("jellyfin.example.com", 20),
            service("jellyseerr.example.com", 0),
            service("traefik.example.com", 0),
        ]);
        fixture.index.update_bookmarks(vec![
            bookmark("ChatGPT", "https://chat.openai.com/"),
            bookmark("Docker Hub", "https://hub.docker.com/"),
        ]);
        fixture
    }

    /// Build a fixture with an empty index.
    pub async fn empty() -> Self {
        let config = load_config_from_str(&format!(
            r#"
[resolver]
home_url = "{HOME}"
allowed_hosts = ["jump.example.com"]
skip_tls_validation = true

[catalog]
service_file = "/tmp/services.yaml"
bookmark_file = "/tmp/bookmarks.yaml"
"#
        ))
        .unwrap();

        let index = Arc::new(MemoryIndex::new());
        let store = Arc::new(MemoryStore::new());

        let prober = Prober::new(Duration::from_millis(100), true).unwrap();
        let resolver = Resolver::new(
            Arc::clone(&index),
            Some(Arc::clone(&store) as Arc<dyn CacheStore>),
            prober,
            ResolverOptions {
                home_url: HOME.to_string(),
                allowed_domains: config.resolver.allowed_domains(),
                max_candidates: config.resolver.max_candidates,
                cache_ttl: Duration::from_secs(60),
                op_timeout: Duration::from_millis(100),
            },
        );

        let (reload_tx, reload_rx) = mpsc::channel(1);
        let (bookmark_tx, bookmark_rx) = mpsc::channel(1);

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&index),
            Some(Arc::clone(&store) as Arc<dyn CacheStore>),
            resolver,
            reload_tx,
            Some(bookmark_tx),
        ));

        Self {
            router: create_router(state),
            index,
            store,
            _reload_rx: reload_rx,
            _bookmark_reload_rx: bookmark_rx,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .uri(path)
            .header(header::HOST, "jump.example.com")
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::HOST, "jump.example.com")
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            location,
            body,
        }
    }
}
