//! Directory Client: queries the external feed-directory HTTPS API
//! (feedly.com's public search endpoint) and filters results by freshness
//! and host.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::normalize::root_host;

const STALE_FEED_WEEKS: i64 = 12;

#[derive(Deserialize)]
struct FeedlySearchResponse {
    #[serde(default)]
    results: Vec<FeedlyResult>,
}

#[derive(Deserialize)]
struct FeedlyResult {
    #[serde(default, rename = "feedId")]
    feed_id: Option<String>,
    #[serde(default, rename = "lastUpdated")]
    last_updated: Option<i64>,
}

impl FeedlyResult {
    fn feed_id(&self) -> Option<&str> {
        self.feed_id.as_deref()
    }
}

/// Truncate an integer to at most `n` digits, taking the leading digits
/// (e.g. a 13-digit millisecond timestamp truncates to 10 digits / seconds).
pub fn truncate_integer(value: i64, n: u32) -> i64 {
    let len = value.unsigned_abs().to_string().len() as u32;
    if len > n {
        let diff = len - n;
        value / 10_i64.pow(diff)
    } else {
        value
    }
}

fn is_stale(last_updated: Option<i64>, stale_before: DateTime<Utc>) -> bool {
    match last_updated {
        Some(ts) => {
            let secs = truncate_integer(ts, 10);
            match DateTime::from_timestamp(secs, 0) {
                Some(dt) => dt <= stale_before,
                None => true,
            }
        }
        None => true,
    }
}

/// Issue the Feedly search GET and return candidate feed URL strings,
/// filtered to results updated within the last `STALE_FEED_WEEKS` weeks.
pub async fn fetch_feedly(http: &reqwest::Client, query: &str) -> Vec<String> {
    let url = format!("https://cloud.feedly.com/v3/search/feeds?query={}", urlencode(query));

    let resp = match http.get(&url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("feedly request failed: {e}");
            return Vec::new();
        }
    };

    if resp.status() != reqwest::StatusCode::OK {
        return Vec::new();
    }

    let parsed: FeedlySearchResponse = match resp.json().await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("feedly response parse failed: {e}");
            return Vec::new();
        }
    };

    let stale_before = Utc::now() - chrono::Duration::weeks(STALE_FEED_WEEKS);

    parsed
        .results
        .into_iter()
        .filter(|r| !is_stale(r.last_updated, stale_before))
        .filter_map(|r| {
            let id = r.feed_id()?;
            let stripped = id.strip_prefix("feed/").unwrap_or(id);
            if stripped.is_empty() {
                None
            } else {
                Some(stripped.to_string())
            }
        })
        .collect()
}

fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Return the subset of `candidates` whose parsed root host equals `host`
/// and whose string form is not already in `existing`. Duplicates collapse
/// (set semantics).
pub fn validate_feedly_urls(candidates: &[String], existing: &HashSet<String>, host: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for candidate in candidates {
        if existing.contains(candidate) {
            continue;
        }
        let Ok(parsed) = url::Url::parse(candidate) else {
            continue;
        };
        let Some(candidate_host) = parsed.host_str() else {
            continue;
        };
        if root_host(candidate_host) != host {
            continue;
        }
        if seen.insert(candidate.clone()) {
            out.push(candidate.clone());
        }
    }
    out
}
