//! Crawl Driver (spec §4.E).
//!
//! The spec treats the crawler as a black box: given seed URLs, it returns
//! an unordered bag of feed records plus a stats map, run to completion on
//! a single (internally parallel) call. Here that black box is a small,
//! real crawler: bounded-concurrency fetches via `reqwest`, parsed through
//! `feed_rs`, bounded by per-request and total timeouts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use tokio::sync::Semaphore;
use url::Url;

use crate::model::Feed;

pub const CONCURRENCY: usize = 20;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(4);
pub const TOTAL_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_DEPTH: usize = 5;

/// Paths probed under the query host when `try_all_paths` (the HTTP API's
/// `checkall`) is set, standing in for the crawler's own path discovery.
const COMMON_FEED_PATHS: &[&str] = &[
    "/feed",
    "/feed.xml",
    "/feed/",
    "/rss",
    "/rss.xml",
    "/atom.xml",
    "/index.xml",
    "/feeds/posts/default",
];

#[derive(Debug, Default, Clone)]
pub struct CrawlStats {
    pub status_codes: HashMap<u16, u32>,
    pub search_time_ms: Option<u64>,
    pub dump_time_ms: Option<u64>,
}

pub struct CrawlOutcome {
    pub feeds: Vec<Feed>,
    pub stats: CrawlStats,
}

/// Drive the crawler with the given seed URLs. Always sorts the returned
/// feeds by URL for stable ordering (the spec leaves the crawler's own
/// output unordered and asks the caller to sort).
pub async fn run_crawl(
    http: &reqwest::Client,
    seed_urls: Vec<Url>,
    try_all_paths: bool,
    fetch_favicon: bool,
) -> Result<CrawlOutcome, crate::error::Error> {
    let start = std::time::Instant::now();

    let mut targets: Vec<Url> = seed_urls;
    if try_all_paths {
        let hosts: Vec<Url> = targets.clone();
        for base in hosts {
            for path in COMMON_FEED_PATHS {
                if let Ok(mut candidate) = base.join(path) {
                    candidate.set_query(None);
                    targets.push(candidate);
                }
            }
        }
    }
    targets.sort_by_key(|u| u.as_str().to_string());
    targets.dedup();

    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let mut tasks = tokio::task::JoinSet::new();

    for url in targets {
        let http = http.clone();
        let semaphore = semaphore.clone();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            fetch_one(&http, url).await
        });
    }

    // Drain completed tasks as they finish rather than awaiting the whole
    // batch behind one outer timeout: on total-timeout expiry we keep
    // whatever has completed so far, per spec §5 ("on timeout the crawler
    // returns whatever it has collected plus stats") instead of discarding
    // it. A task panic is treated as an internal crawler failure and
    // surfaces as `CrawlerError` (spec §4.E: "on internal failure the
    // driver surfaces an opaque error").
    let deadline = tokio::time::Instant::now() + TOTAL_TIMEOUT;
    let mut outcomes = Vec::new();
    loop {
        let remaining = deadline
            .checked_duration_since(tokio::time::Instant::now())
            .unwrap_or(Duration::ZERO);
        if remaining.is_zero() {
            tracing::warn!(
                "crawl total timeout exceeded, returning {} partial result(s)",
                outcomes.len()
            );
            tasks.abort_all();
            break;
        }
        match tokio::time::timeout(remaining, tasks.join_next()).await {
            Ok(Some(Ok(outcome))) => outcomes.push(outcome),
            Ok(Some(Err(join_err))) => {
                tasks.abort_all();
                return Err(crate::error::Error::CrawlerError(format!(
                    "crawl task failed: {join_err}"
                )));
            }
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(
                    "crawl total timeout exceeded, returning {} partial result(s)",
                    outcomes.len()
                );
                tasks.abort_all();
                break;
            }
        }
    }

    let mut stats = CrawlStats::default();
    let mut feeds = Vec::new();

    for outcome in outcomes {
        // status 0 means the request never got a response at all (connect
        // error or per-request timeout) — it is not an HTTP status and must
        // not count as one, or the orchestrator's "no response" check
        // (spec §4.G) could never see an empty status_codes map.
        if outcome.status != 0 {
            *stats.status_codes.entry(outcome.status).or_insert(0) += 1;
        }
        if let Some(mut feed) = outcome.feed {
            if fetch_favicon {
                if let Some(favicon_url) = favicon_candidate(&feed.url) {
                    if let Some((data_uri, resolved)) = fetch_favicon_data_uri(http, &favicon_url).await {
                        feed.favicon = Some(resolved);
                        feed.favicon_data_uri = Some(data_uri);
                    }
                }
            }
            feeds.push(feed);
        }
    }

    feeds.sort_by(|a, b| a.url.cmp(&b.url));
    feeds.dedup_by(|a, b| a.url == b.url);

    stats.search_time_ms = Some(start.elapsed().as_millis() as u64);

    Ok(CrawlOutcome { feeds, stats })
}

struct FetchOutcome {
    status: u16,
    feed: Option<Feed>,
}

async fn fetch_one(http: &reqwest::Client, url: Url) -> FetchOutcome {
    let result = tokio::time::timeout(REQUEST_TIMEOUT, http.get(url.clone()).send()).await;

    let resp = match result {
        Ok(Ok(r)) => r,
        Ok(Err(e)) => {
            tracing::debug!("crawl request failed for {url}: {e}");
            return FetchOutcome { status: 0, feed: None };
        }
        Err(_) => {
            tracing::debug!("crawl request timed out for {url}");
            return FetchOutcome { status: 0, feed: None };
        }
    };

    let status = resp.status().as_u16();
    if status != 200 {
        return FetchOutcome { status, feed: None };
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let bytes = match resp.bytes().await {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!("crawl body read failed for {url}: {e}");
            return FetchOutcome { status, feed: None };
        }
    };

    let content_length = Some(bytes.len() as i64);

    let parsed = match feed_rs::parser::parse(&bytes[..]) {
        Ok(p) => p,
        Err(_) => return FetchOutcome { status, feed: None },
    };

    let feed = build_feed(&url, &parsed, content_type, content_length);
    FetchOutcome { status, feed: Some(feed) }
}

fn build_feed(
    source_url: &Url,
    parsed: &feed_rs::model::Feed,
    content_type: Option<String>,
    content_length: Option<i64>,
) -> Feed {
    let self_url = parsed
        .links
        .iter()
        .find(|l| l.rel.as_deref() == Some("self"))
        .map(|l| l.href.clone());

    let site_url = parsed
        .links
        .iter()
        .find(|l| l.rel.as_deref() != Some("self") && l.rel.as_deref() != Some("hub"))
        .map(|l| l.href.clone());

    let hubs: Vec<String> = parsed
        .links
        .iter()
        .filter(|l| l.rel.as_deref() == Some("hub"))
        .map(|l| l.href.clone())
        .collect();

    let title = parsed.title.as_ref().map(|t| t.content.trim().to_string());
    let description = parsed.description.as_ref().map(|t| t.content.trim().to_string());

    let version = match parsed.feed_type {
        feed_rs::model::FeedType::Atom => "atom10",
        feed_rs::model::FeedType::RSS0 => "rss090",
        feed_rs::model::FeedType::RSS1 => "rss100",
        feed_rs::model::FeedType::RSS2 => "rss20",
        feed_rs::model::FeedType::JSON => "json1",
    }
    .to_string();

    let item_count = parsed.entries.len() as i64;
    let recent_cutoff = chrono::Utc::now() - chrono::Duration::days(30);
    let recent_entries = parsed
        .entries
        .iter()
        .filter(|e| {
            e.published
                .or(e.updated)
                .map(|d| d.with_timezone(&chrono::Utc) > recent_cutoff)
                .unwrap_or(false)
        })
        .count();
    let velocity = recent_entries as f64 / 30.0;

    let last_updated = parsed
        .entries
        .iter()
        .filter_map(|e| e.published.or(e.updated))
        .map(|d| d.with_timezone(&chrono::Utc))
        .max()
        .or_else(|| parsed.updated.map(|d| d.with_timezone(&chrono::Utc)));

    Feed {
        url: source_url.to_string(),
        site_url,
        self_url,
        title,
        description,
        site_name: None,
        favicon: None,
        favicon_data_uri: None,
        hubs: hubs.clone(),
        is_push: !hubs.is_empty(),
        is_podcast: false,
        content_type,
        content_length,
        version: Some(version),
        bozo: 0,
        velocity,
        item_count,
        score: 0,
        last_updated,
        last_seen: None,
        host: String::new(),
    }
}

fn favicon_candidate(feed_url: &str) -> Option<Url> {
    let parsed = Url::parse(feed_url).ok()?;
    let mut favicon = parsed.clone();
    favicon.set_path("/favicon.ico");
    favicon.set_query(None);
    Some(favicon)
}

async fn fetch_favicon_data_uri(http: &reqwest::Client, favicon_url: &Url) -> Option<(String, String)> {
    let resp = tokio::time::timeout(REQUEST_TIMEOUT, http.get(favicon_url.clone()).send())
        .await
        .ok()?
        .ok()?;
    if resp.status() != 200 {
        return None;
    }
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/x-icon")
        .to_string();
    let bytes = resp.bytes().await.ok()?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Some((format!("data:{content_type};base64,{encoded}"), favicon_url.to_string()))
}
