use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::Error;
use crate::http::{query_bool, query_str};
use crate::normalize::validate_query;
use crate::opml;
use crate::orchestrator::SearchOptions;
use crate::serializer::serialize_feeds;
use crate::state::AppState;

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, Error> {
    let raw_url = query_str(&params, "url").unwrap_or("");
    let query_url = validate_query(raw_url)?;

    let want_stats = query_bool(&params, "stats", false);
    let want_info = query_bool(&params, "info", true);
    let want_opml = query_bool(&params, "opml", false);

    let opts = SearchOptions {
        check_directory: query_bool(&params, "feedly", true),
        force_crawl: query_bool(&params, "force", false),
        check_all: query_bool(&params, "checkall", false),
        skip_crawl: query_bool(&params, "skip_crawl", false),
        fetch_favicon: query_bool(&params, "favicon", false),
    };

    let start = Instant::now();
    let result = state.orchestrator.search(query_url, opts).await?;
    let search_time_ms = start.elapsed().as_millis() as u64;

    if want_opml {
        let xml = opml::write_opml("feedgate", &result.feeds);
        return Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
            xml,
        )
            .into_response());
    }

    let only: Option<Vec<String>> = if want_info {
        None
    } else {
        Some(vec!["url".to_string()])
    };

    let feeds_json = serialize_feeds(&result.feeds, only.as_deref(), None);

    if want_stats {
        let crawl_stats = result.stats.map(|s| {
            json!({
                "status_codes": s.status_codes,
                "search_time_ms": s.search_time_ms,
                "dump_time_ms": s.dump_time_ms,
            })
        });
        return Ok(Json(json!({
            "feeds": feeds_json,
            "search_time_ms": search_time_ms,
            "crawl_stats": crawl_stats,
        }))
        .into_response());
    }

    Ok(Json(feeds_json).into_response())
}
