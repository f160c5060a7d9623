//! End-to-end tests for `Orchestrator::search` against a real in-memory
//! store and a local mock HTTP server, covering spec §8's scenarios that
//! the pure `should_run_crawl` unit test doesn't reach: a cold crawl, a warm
//! path-cache hit that must not touch the network, a forced recrawl, and a
//! totally unreachable host surfacing `NotFound`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use url::Url;

use feedgate::error::Error;
use feedgate::model::{Feed, SiteHost, SitePath};
use feedgate::normalize::root_host;
use feedgate::orchestrator::{Orchestrator, SearchOptions};
use feedgate::store::Store;

const FEED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
<title>Example Feed</title>
<description>An example feed</description>
<link>http://example.com</link>
<item><title>Post</title><link>http://example.com/1</link></item>
</channel></rss>"#;

#[derive(Clone)]
struct Hits(Arc<AtomicUsize>);

async fn feed_handler(State(hits): State<Hits>) -> axum::response::Response {
    hits.0.fetch_add(1, Ordering::SeqCst);
    axum::response::Response::builder()
        .status(200)
        .header(axum::http::header::CONTENT_TYPE, "application/rss+xml")
        .body(axum::body::Body::from(FEED_XML))
        .unwrap()
}

/// Spawn a local server that answers every request with a valid RSS feed,
/// tracking how many requests it received.
async fn spawn_feed_server() -> (SocketAddr, Hits) {
    let hits = Hits(Arc::new(AtomicUsize::new(0)));
    let app = Router::new()
        .route("/", get(feed_handler))
        .route("/{*path}", get(feed_handler))
        .with_state(hits.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, hits)
}

fn test_orchestrator(store: Store) -> Orchestrator {
    let http = reqwest::Client::builder().build().unwrap();
    Orchestrator::new(http, store, 7)
}

#[tokio::test]
async fn cold_query_discovers_and_persists_a_feed() {
    let (addr, hits) = spawn_feed_server().await;
    let store = Store::open_in_memory().unwrap();
    let orchestrator = test_orchestrator(store);

    let query_url = Url::parse(&format!("http://{addr}/")).unwrap();
    let host = root_host(query_url.host_str().unwrap());

    let opts = SearchOptions {
        check_directory: false,
        ..SearchOptions::default()
    };
    let result = orchestrator.search(query_url.clone(), opts).await.unwrap();

    assert!(result.crawled);
    assert_eq!(result.feeds.len(), 1);
    assert_eq!(result.feeds[0].url, query_url.as_str());
    assert!(hits.0.load(Ordering::SeqCst) >= 1);

    let persisted = Arc::clone(orchestrator.store()).query_site_feeds_async(host).await;
    assert_eq!(persisted.feeds.len(), 1);
    assert!(persisted.last_seen.is_some());
}

#[tokio::test]
async fn warm_path_cache_hit_skips_crawl() {
    let (addr, hits) = spawn_feed_server().await;
    let store = Store::open_in_memory().unwrap();

    let host = addr.ip().to_string();
    let feed_url = format!("http://{addr}/blog/rss");
    let now = Utc::now();

    let mut site = SiteHost::new(host.clone());
    site.last_seen = Some(now);
    let feed = Feed {
        url: feed_url.clone(),
        host: host.clone(),
        last_seen: Some(now),
        title: Some("Blog".to_string()),
        ..Default::default()
    };
    site.feeds.insert(feed.url.clone(), feed.clone());
    let mut site_path = SitePath::new(host.clone(), "/blog".to_string());
    site_path.last_seen = Some(now);
    site_path.feeds = vec![feed.url.clone()];
    store.save(&site, &[feed], &site_path);

    let orchestrator = test_orchestrator(store);
    let query_url = Url::parse(&format!("http://{addr}/blog")).unwrap();

    let result = orchestrator.search(query_url, SearchOptions::default()).await.unwrap();

    assert!(!result.crawled);
    assert_eq!(result.feeds.len(), 1);
    assert_eq!(result.feeds[0].url, feed_url);
    assert_eq!(
        hits.0.load(Ordering::SeqCst),
        0,
        "a memoized path hit must not issue any HTTP request"
    );
}

#[tokio::test]
async fn force_refresh_recrawls_even_when_recently_seen() {
    let (addr, hits) = spawn_feed_server().await;
    let store = Store::open_in_memory().unwrap();

    let host = addr.ip().to_string();
    let now = Utc::now();
    let mut site = SiteHost::new(host.clone());
    site.last_seen = Some(now);
    let mut site_path = SitePath::new(host.clone(), "/".to_string());
    site_path.last_seen = Some(now);
    store.save(&site, &[], &site_path);

    let orchestrator = test_orchestrator(store);
    let query_url = Url::parse(&format!("http://{addr}/")).unwrap();

    let opts = SearchOptions {
        check_directory: false,
        force_crawl: true,
        ..SearchOptions::default()
    };
    let result = orchestrator.search(query_url, opts).await.unwrap();

    assert!(result.crawled);
    assert_eq!(hits.0.load(Ordering::SeqCst), 1);
    assert_eq!(result.feeds.len(), 1);
}

#[tokio::test]
async fn no_http_response_surfaces_not_found() {
    let store = Store::open_in_memory().unwrap();
    let orchestrator = test_orchestrator(store);

    // Bind then immediately drop a listener: nothing answers on this port,
    // so the crawl's status_codes map stays empty (connect errors are not
    // HTTP statuses).
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let query_url = Url::parse(&format!("http://{addr}/")).unwrap();
    let opts = SearchOptions {
        check_directory: false,
        ..SearchOptions::default()
    };
    let err = orchestrator.search(query_url, opts).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}
