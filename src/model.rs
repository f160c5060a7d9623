use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A discovered feed document at a site.
///
/// `url` is unique across the entire store (scheme-sensitive). `host` is
/// denormalized: it always equals the root host of `site_url` when both are
/// present, kept in sync by the orchestrator at merge time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feed {
    pub url: String,
    pub site_url: Option<String>,
    pub self_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub site_name: Option<String>,
    pub favicon: Option<String>,
    pub favicon_data_uri: Option<String>,
    pub hubs: Vec<String>,
    pub is_push: bool,
    pub is_podcast: bool,
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
    pub version: Option<String>,
    pub bozo: i32,
    pub velocity: f64,
    pub item_count: i64,
    pub score: i32,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub host: String,
}

impl Feed {
    /// `url` non-empty => record is valid, per the Feed invariant.
    pub fn is_valid(&self) -> bool {
        !self.url.is_empty()
    }

    /// Merge missing data from a matching feed that wasn't (re)fetched on
    /// this crawl. Conservative: only fills fields that are absent on
    /// `self`, never overwrites.
    pub fn merge_from(&mut self, other: &Feed) {
        if self.favicon.is_none() {
            if let Some(fav) = &other.favicon {
                self.favicon = Some(fav.clone());
                // favicon_data_uri only carries over if the favicon itself matches.
                if self.favicon_data_uri.is_none() {
                    if let Some(uri) = &other.favicon_data_uri {
                        self.favicon_data_uri = Some(uri.clone());
                    }
                }
            }
        } else if self.favicon == other.favicon && self.favicon_data_uri.is_none() {
            if let Some(uri) = &other.favicon_data_uri {
                self.favicon_data_uri = Some(uri.clone());
            }
        }
        if self.site_url.is_none() {
            if let Some(v) = &other.site_url {
                self.site_url = Some(v.clone());
            }
        }
        if self.site_name.is_none() {
            if let Some(v) = &other.site_name {
                self.site_name = Some(v.clone());
            }
        }
    }
}

/// Metadata for a root host. Conceptually owns its Feeds (same partition in
/// the KV store).
#[derive(Clone, Debug, Default)]
pub struct SiteHost {
    pub host: String,
    pub last_seen: Option<DateTime<Utc>>,
    /// Feeds under this host, keyed by feed URL string. Populated
    /// transiently from the store at load time; not a separate column.
    pub feeds: HashMap<String, Feed>,
}

impl SiteHost {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            last_seen: None,
            feeds: HashMap::new(),
        }
    }

    pub fn load_feeds(&mut self, feeds: Vec<Feed>) {
        self.feeds = feeds.into_iter().map(|f| (f.url.clone(), f)).collect();
    }
}

/// Per-query-path memoization record: which feeds were found when this
/// specific path was crawled.
#[derive(Clone, Debug, Default)]
pub struct SitePath {
    pub host: String,
    pub path: String,
    pub last_seen: Option<DateTime<Utc>>,
    /// URLs of feeds under `host`, referenced weakly (by string, never an
    /// owning pointer). Consumers must tolerate dangling references.
    pub feeds: Vec<String>,
}

impl SitePath {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            last_seen: None,
            feeds: Vec::new(),
        }
    }
}
