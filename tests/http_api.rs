use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;

use feedgate::config::Config;
use feedgate::handlers;
use feedgate::model::{Feed, SiteHost, SitePath};
use feedgate::orchestrator::Orchestrator;
use feedgate::state::AppState;
use feedgate::store::Store;

fn test_config() -> Config {
    Config {
        user_agent: "feedgate-tests/0.1".to_string(),
        db_path: ":memory:".to_string(),
        days_checked_recently: 7,
        bind_addr: "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
        sentry_dsn: None,
    }
}

fn build_router(store: Store) -> Router {
    let http = reqwest::Client::builder().build().unwrap();
    let orchestrator = Orchestrator::new(http, store, 7);
    let state = Arc::new(AppState::new(test_config(), orchestrator));

    Router::new()
        .route("/health", get(handlers::pages::health))
        .route("/api/v1/search", get(handlers::search::search))
        .route("/api/v1/sites", get(handlers::sites::list_sites))
        .route("/api/v1/sites/{host}", get(handlers::sites::get_site))
        .with_state(state)
}

#[tokio::test]
async fn health_reports_ok() {
    let app = build_router(Store::open_in_memory().unwrap());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn list_sites_starts_empty() {
    let app = build_router(Store::open_in_memory().unwrap());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/sites")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn get_site_for_absent_host_returns_402() {
    let app = build_router(Store::open_in_memory().unwrap());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/sites/nowhere.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::from_u16(402).unwrap());
}

#[tokio::test]
async fn get_site_for_known_host_returns_its_feeds() {
    let store = Store::open_in_memory().unwrap();

    let host = "example.com";
    let mut site = SiteHost::new(host);
    site.last_seen = Some(chrono::Utc::now());
    let feed = Feed {
        url: "https://example.com/feed.xml".to_string(),
        host: host.to_string(),
        title: Some("Example Feed".to_string()),
        last_seen: Some(chrono::Utc::now()),
        ..Default::default()
    };
    site.feeds.insert(feed.url.clone(), feed.clone());
    let mut path = SitePath::new(host, "/");
    path.last_seen = Some(chrono::Utc::now());
    path.feeds = vec![feed.url.clone()];
    store.save(&site, &[feed], &path);

    let app = build_router(store);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/sites/example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["host"], serde_json::json!("example.com"));
    assert_eq!(body["feeds"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn search_without_url_param_is_bad_request() {
    let app = build_router(Store::open_in_memory().unwrap());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/search")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_with_malformed_url_is_bad_request() {
    let app = build_router(Store::open_in_memory().unwrap());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/search?url=not a url")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
