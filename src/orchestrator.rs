//! Search Orchestrator (spec §4.G): the coordination layer that validates a
//! query, consults the store, decides whether to crawl, fans out to the
//! Directory Client and Crawl Driver, merges/scores/persists results, and
//! selects the subset to return.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use url::Url;

use crate::crawl::{self, CrawlStats};
use crate::error::Error;
use crate::feedly;
use crate::freshness::seen_recently;
use crate::model::{Feed, SitePath};
use crate::normalize::{has_path, root_host};
use crate::score::score_feed;
use crate::store::Store;

pub struct SearchOptions {
    pub check_directory: bool,
    pub force_crawl: bool,
    pub check_all: bool,
    pub skip_crawl: bool,
    pub fetch_favicon: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            check_directory: true,
            force_crawl: false,
            check_all: false,
            skip_crawl: false,
            fetch_favicon: false,
        }
    }
}

pub struct SearchResult {
    pub feeds: Vec<Feed>,
    pub crawled: bool,
    pub stats: Option<CrawlStats>,
}

/// Crawl decision policy (spec §4.G step 4 / Invariant I5).
pub fn should_run_crawl(force: bool, skip: bool, searching_path: bool, recent: bool) -> bool {
    if force {
        true
    } else if skip {
        false
    } else if searching_path {
        true
    } else {
        !recent
    }
}

pub struct Orchestrator {
    http: reqwest::Client,
    store: Arc<Store>,
    days_checked_recently: i64,
}

impl Orchestrator {
    pub fn new(http: reqwest::Client, store: Store, days_checked_recently: i64) -> Self {
        Self {
            http,
            store: Arc::new(store),
            days_checked_recently,
        }
    }

    pub async fn search(&self, query_url: Url, opts: SearchOptions) -> Result<SearchResult, Error> {
        let searching_path = has_path(&query_url);
        let host = root_host(query_url.host_str().unwrap_or_default());

        let mut site = Arc::clone(&self.store).query_site_feeds_async(host.clone()).await;
        let now = Utc::now();

        // Step 2: cache hit on a memoized path — no crawl, no outbound HTTP.
        if searching_path && !site.feeds.is_empty() && !opts.force_crawl {
            let site_path = Arc::clone(&self.store)
                .query_site_path_async(host.clone(), query_url.path().to_string())
                .await;
            if seen_recently(site_path.last_seen, self.days_checked_recently, now) {
                let feeds: Vec<Feed> = site_path
                    .feeds
                    .iter()
                    .filter_map(|url| site.feeds.get(url).cloned())
                    .collect();
                return Ok(SearchResult {
                    feeds,
                    crawled: false,
                    stats: None,
                });
            }
        }

        let site_crawled_recently = seen_recently(site.last_seen, self.days_checked_recently, now);
        let run_crawl = should_run_crawl(opts.force_crawl, opts.skip_crawl, searching_path, site_crawled_recently);

        let mut crawl_feed_list: Vec<Feed> = Vec::new();
        let mut crawl_stats: Option<CrawlStats> = None;
        let mut crawled = false;

        if run_crawl {
            let existing: HashSet<String> = site.feeds.keys().cloned().collect();
            let mut seeds: Vec<Url> = vec![query_url.clone()];

            if opts.check_directory && !site_crawled_recently {
                let candidates = feedly::fetch_feedly(&self.http, query_url.as_str()).await;
                let validated = feedly::validate_feedly_urls(&candidates, &existing, &host);
                for u in validated {
                    if let Ok(parsed) = Url::parse(&u) {
                        seeds.push(parsed);
                    }
                }
            }

            if !searching_path {
                for feed in site.feeds.values() {
                    if !seen_recently(feed.last_seen, self.days_checked_recently, now) {
                        if let Ok(parsed) = Url::parse(&feed.url) {
                            seeds.push(parsed);
                        }
                    }
                }
            }

            seeds.sort_by_key(|u| u.as_str().to_string());
            seeds.dedup();

            let outcome = crawl::run_crawl(&self.http, seeds, opts.check_all, opts.fetch_favicon).await?;
            crawl_feed_list = outcome.feeds;
            crawl_stats = Some(outcome.stats);
            crawled = true;
        }

        for mut feed in crawl_feed_list.clone() {
            feed.last_seen = Some(now);
            feed.host = site.host.clone();
            if let Some(existing_feed) = site.feeds.get(&feed.url).cloned() {
                feed.merge_from(&existing_feed);
            }
            if feed.is_valid() {
                site.feeds.insert(feed.url.clone(), feed);
            }
        }

        let mut all_feeds: Vec<Feed> = site.feeds.values().cloned().collect();
        for feed in all_feeds.iter_mut() {
            feed.host = site.host.clone();
            score_feed(feed, &host);
        }
        // Keep `site.feeds` in sync with the scored copies so persistence
        // below writes scored records.
        site.feeds = all_feeds.iter().cloned().map(|f| (f.url.clone(), f)).collect();

        let has_200 = crawl_stats
            .as_ref()
            .map(|s| s.status_codes.contains_key(&200))
            .unwrap_or(false);

        if crawled && has_200 {
            // site.last_seen only advances when a crawl actually ran and
            // produced at least one HTTP 200 (spec invariant I3).
            site.last_seen = Some(now);

            let site_path_feeds: Vec<String> = crawl_feed_list.iter().map(|f| f.url.clone()).collect();
            let mut site_path = SitePath::new(host.clone(), query_url.path().to_string());
            site_path.last_seen = Some(now);
            site_path.feeds = site_path_feeds;

            let feeds_to_save: Vec<Feed> = site.feeds.values().cloned().collect();
            Arc::clone(&self.store)
                .save_async(site.clone(), feeds_to_save, site_path)
                .await;
        }

        let selected: Vec<Feed> = if searching_path {
            crawl_feed_list
                .into_iter()
                .map(|f| site.feeds.get(&f.url).cloned().unwrap_or(f))
                .collect()
        } else {
            site.feeds.values().cloned().collect()
        };

        // No feeds to return and the crawl that did run produced no HTTP
        // response at all (spec §4.G): surface NotFound. Otherwise return
        // whatever was selected, possibly empty — in particular a recrawl
        // of a host with previously-known feeds must still return them even
        // if this attempt's own stats are empty (e.g. it hit the crawler's
        // total timeout before any response came back).
        if crawled && selected.is_empty() {
            let no_response = crawl_stats
                .as_ref()
                .map(|s| s.status_codes.is_empty())
                .unwrap_or(false);
            if no_response {
                return Err(Error::NotFound(format!("No Response from URL: {query_url}")));
            }
        }

        Ok(SearchResult {
            feeds: selected,
            crawled,
            stats: crawl_stats,
        })
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }
}
