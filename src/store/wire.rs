//! KV row encode/decode: typed projection of `Feed`/`SiteHost`/`SitePath`
//! into the PK/SK/payload shape described in spec §4.C. Dispatch is purely
//! on PK/SK prefix string, never on a runtime-polymorphic record — this is
//! a separate, independent encoder from `crate::serializer` even though
//! both work off the same model structs (Design Note: "two independent
//! encoder objects with a shared set of field definitions").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Feed, SiteHost, SitePath};

pub const SITE_PK_PREFIX: &str = "SITE#";
pub const SITE_SK_METADATA: &str = "#METADATA#";
pub const FEED_SK_PREFIX: &str = "FEED#";
pub const SITEPATH_PK_PREFIX: &str = "SITEPATH#";
pub const SITEPATH_SK_PREFIX: &str = "PATH#";

pub fn site_pk(host: &str) -> String {
    format!("{SITE_PK_PREFIX}{host}")
}

pub fn feed_sk(url: &str) -> String {
    format!("{FEED_SK_PREFIX}{url}")
}

pub fn sitepath_pk(host: &str) -> String {
    format!("{SITEPATH_PK_PREFIX}{host}")
}

pub fn sitepath_sk(path: &str) -> String {
    format!("{SITEPATH_SK_PREFIX}{path}")
}

/// A dump that would emit `null` for a field omits that field instead, to
/// keep store size bounded (spec §4.C).
#[derive(Serialize, Deserialize, Default)]
struct SiteRow {
    host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_seen: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Default)]
struct FeedRow {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    site_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    self_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    favicon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    favicon_data_uri: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    hubs: Vec<String>,
    is_push: bool,
    is_podcast: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    bozo: i32,
    velocity: f64,
    item_count: i64,
    score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_seen: Option<DateTime<Utc>>,
    host: String,
}

#[derive(Serialize, Deserialize, Default)]
struct SitePathRow {
    host: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_seen: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    feeds: Vec<String>,
}

pub fn encode_site(site: &SiteHost) -> (String, String, String) {
    let row = SiteRow {
        host: site.host.clone(),
        last_seen: site.last_seen,
    };
    let payload = serde_json::to_string(&row).expect("SiteRow serializes");
    (site_pk(&site.host), SITE_SK_METADATA.to_string(), payload)
}

pub fn decode_site(payload: &str) -> Result<SiteHost, serde_json::Error> {
    let row: SiteRow = serde_json::from_str(payload)?;
    Ok(SiteHost {
        host: row.host,
        last_seen: row.last_seen,
        feeds: Default::default(),
    })
}

pub fn encode_feed(feed: &Feed) -> (String, String, String) {
    let row = FeedRow {
        url: feed.url.clone(),
        site_url: feed.site_url.clone(),
        self_url: feed.self_url.clone(),
        title: feed.title.clone(),
        description: feed.description.clone(),
        site_name: feed.site_name.clone(),
        favicon: feed.favicon.clone(),
        favicon_data_uri: feed.favicon_data_uri.clone(),
        hubs: feed.hubs.clone(),
        is_push: feed.is_push,
        is_podcast: feed.is_podcast,
        content_type: feed.content_type.clone(),
        content_length: feed.content_length,
        version: feed.version.clone(),
        bozo: feed.bozo,
        velocity: feed.velocity,
        item_count: feed.item_count,
        score: feed.score,
        last_updated: feed.last_updated,
        last_seen: feed.last_seen,
        host: feed.host.clone(),
    };
    let payload = serde_json::to_string(&row).expect("FeedRow serializes");
    (site_pk(&feed.host), feed_sk(&feed.url), payload)
}

pub fn decode_feed(payload: &str) -> Result<Feed, serde_json::Error> {
    let row: FeedRow = serde_json::from_str(payload)?;
    Ok(Feed {
        url: row.url,
        site_url: row.site_url,
        self_url: row.self_url,
        title: row.title,
        description: row.description,
        site_name: row.site_name,
        favicon: row.favicon,
        favicon_data_uri: row.favicon_data_uri,
        hubs: row.hubs,
        is_push: row.is_push,
        is_podcast: row.is_podcast,
        content_type: row.content_type,
        content_length: row.content_length,
        version: row.version,
        bozo: row.bozo,
        velocity: row.velocity,
        item_count: row.item_count,
        score: row.score,
        last_updated: row.last_updated,
        last_seen: row.last_seen,
        host: row.host,
    })
}

pub fn encode_sitepath(sp: &SitePath) -> (String, String, String) {
    let row = SitePathRow {
        host: sp.host.clone(),
        path: sp.path.clone(),
        last_seen: sp.last_seen,
        feeds: sp.feeds.clone(),
    };
    let payload = serde_json::to_string(&row).expect("SitePathRow serializes");
    (sitepath_pk(&sp.host), sitepath_sk(&sp.path), payload)
}

pub fn decode_sitepath(payload: &str) -> Result<SitePath, serde_json::Error> {
    let row: SitePathRow = serde_json::from_str(payload)?;
    Ok(SitePath {
        host: row.host,
        path: row.path,
        last_seen: row.last_seen,
        feeds: row.feeds,
    })
}
