use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::serializer::serialize_site;
use crate::state::AppState;

pub async fn list_sites(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let sites = Arc::clone(state.orchestrator.store()).list_sites_async().await;
    let body: Vec<_> = sites
        .into_iter()
        .map(|s| {
            json!({
                "host": s.host,
                "last_seen": s.last_seen.map(|d| d.to_rfc3339()),
            })
        })
        .collect();
    Json(json!(body))
}

pub async fn get_site(State(state): State<Arc<AppState>>, Path(host): Path<String>) -> Response {
    let site = Arc::clone(state.orchestrator.store())
        .query_site_feeds_async(host.clone())
        .await;
    if site.last_seen.is_none() && site.feeds.is_empty() {
        // Absent site record. The spec specifies this unusual status code
        // verbatim (§6.1) rather than the more conventional 404.
        return (
            StatusCode::from_u16(402).expect("valid status"),
            Json(json!({"error": "Not Found", "message": format!("No site found for host '{host}'")})),
        )
            .into_response();
    }
    Json(serialize_site(&site)).into_response()
}
