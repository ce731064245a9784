use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use crate::state::AppState;

/// Trigger an immediate reload of services and bookmarks.
///
/// The trigger channels have capacity one: a signal that finds the slot
/// occupied is dropped, so repeated requests coalesce into one reload.
pub async fn reload(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    let services_triggered = state.reload_trigger().try_send(()).is_ok();
    if services_triggered {
        info!("manual services reload triggered via endpoint");
    } else {
        warn!("services reload already in progress");
    }

    let mut bookmarks_triggered = false;
    if let Some(trigger) = state.bookmark_reload_trigger() {
        bookmarks_triggered = trigger.try_send(()).is_ok();
        if bookmarks_triggered {
            info!("manual bookmarks reload triggered via endpoint");
        } else {
            warn!("bookmarks reload already in progress");
        }
    }

    if services_triggered || bookmarks_triggered {
        (
            StatusCode::ACCEPTED,
            "Reload triggered successfully\n".to_string(),
        )
    } else {
        (
            StatusCode::TOO_MANY_REQUESTS,
            "Reload already in progress, please wait\n".to_string(),
        )
    }
}

#[derive(Serialize)]
pub struct ComponentStatus {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services_loaded: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reload: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct InfraResponse {
    pub routing_mode: String,
    pub components: HashMap<String, ComponentStatus>,
}

/// Per-component health plus the derived routing mode.
pub async fn infra(State(state): State<Arc<AppState>>) -> Json<InfraResponse> {
    let services_loaded = state.index().service_count();
    let last_reload = state
        .index()
        .last_services_reload()
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    let mut components = HashMap::new();
    components.insert(
        "catalog".to_string(),
        ComponentStatus {
            ok: services_loaded > 0,
            services_loaded: Some(services_loaded),
            last_reload: Some(last_reload),
            mode: None,
            impact: None,
            error: None,
        },
    );
    components.insert("cache".to_string(), check_cache(&state).await);
    components.insert(
        "resolver".to_string(),
        ComponentStatus {
            ok: true,
            services_loaded: None,
            last_reload: None,
            mode: Some("fuzzy+usage-learning".to_string()),
            impact: None,
            error: None,
        },
    );

    Json(InfraResponse {
        routing_mode: routing_mode(&components).to_string(),
        components,
    })
}

/// No services is critical; a dead cache only degrades (no usage
/// persistence, no resolution caching).
fn routing_mode(components: &HashMap<String, ComponentStatus>) -> &'static str {
    if !components.get("catalog").map_or(false, |c| c.ok) {
        return "critical";
    }
    if !components.get("cache").map_or(false, |c| c.ok) {
        return "degraded";
    }
    "intelligent"
}

async fn check_cache(state: &AppState) -> ComponentStatus {
    let Some(store) = state.store() else {
        return ComponentStatus {
            ok: false,
            services_loaded: None,
            last_reload: None,
            mode: Some("degraded".to_string()),
            impact: Some("usage-learning-disabled".to_string()),
            error: Some("not configured".to_string()),
        };
    };

    let ping = tokio::time::timeout(Duration::from_secs(2), store.ping()).await;
    match ping {
        Ok(Ok(())) => ComponentStatus {
            ok: true,
            services_loaded: None,
            last_reload: None,
            mode: Some("optimal".to_string()),
            impact: Some("usage-learning-enabled".to_string()),
            error: None,
        },
        Ok(Err(e)) => ComponentStatus {
            ok: false,
            services_loaded: None,
            last_reload: None,
            mode: Some("degraded".to_string()),
            impact: Some("usage-learning-disabled".to_string()),
            error: Some(e.to_string()),
        },
        Err(_) => ComponentStatus {
            ok: false,
            services_loaded: None,
            last_reload: None,
            mode: Some("degraded".to_string()),
            impact: Some("usage-learning-disabled".to_string()),
            error: Some("timeout".to_string()),
        },
    }
}
