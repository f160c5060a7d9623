//! External Serializer (spec §4.H): projects internal records into stable
//! client-facing JSON shapes. Independent from `crate::store::wire` even
//! though both work off the same `Feed`/`SiteHost` structs — this one never
//! omits a key for being `null`, it only honors caller-requested projection
//! (`only`/`exclude`).

use serde_json::{json, Map, Value};

use crate::model::{Feed, SiteHost};

fn non_empty_string(v: &Option<String>) -> Value {
    match v {
        Some(s) if !s.is_empty() => Value::String(s.clone()),
        _ => Value::Null,
    }
}

/// Project a Feed into its stable wire shape (spec §6.2). All fields are
/// present; missing/empty values serialize as `null`.
pub fn serialize_feed(feed: &Feed) -> Value {
    json!({
        "url": non_empty_string(&Some(feed.url.clone())),
        "site_url": non_empty_string(&feed.site_url),
        "self_url": non_empty_string(&feed.self_url),
        "title": non_empty_string(&feed.title),
        "description": non_empty_string(&feed.description),
        "site_name": non_empty_string(&feed.site_name),
        "favicon": non_empty_string(&feed.favicon),
        "favicon_data_uri": non_empty_string(&feed.favicon_data_uri),
        "hubs": feed.hubs,
        "is_push": feed.is_push,
        "is_podcast": feed.is_podcast,
        "content_type": non_empty_string(&feed.content_type),
        "content_length": feed.content_length,
        "version": non_empty_string(&feed.version),
        "bozo": feed.bozo,
        "velocity": feed.velocity,
        "item_count": feed.item_count,
        "score": feed.score,
        "last_updated": feed.last_updated.map(|d| d.to_rfc3339()),
        "last_seen": feed.last_seen.map(|d| d.to_rfc3339()),
    })
}

/// Apply `only`/`exclude` field projection to a serialized object. `only`
/// takes precedence when both are given.
pub fn project(value: Value, only: Option<&[String]>, exclude: Option<&[String]>) -> Value {
    let Value::Object(map) = value else {
        return value;
    };

    let filtered: Map<String, Value> = if let Some(only) = only {
        map.into_iter().filter(|(k, _)| only.contains(k)).collect()
    } else if let Some(exclude) = exclude {
        map.into_iter().filter(|(k, _)| !exclude.contains(k)).collect()
    } else {
        map
    };

    Value::Object(filtered)
}

pub fn serialize_feeds(feeds: &[Feed], only: Option<&[String]>, exclude: Option<&[String]>) -> Value {
    Value::Array(
        feeds
            .iter()
            .map(|f| project(serialize_feed(f), only, exclude))
            .collect(),
    )
}

/// Project a SiteHost into `{host, last_seen, feeds: [...]}`.
pub fn serialize_site(site: &SiteHost) -> Value {
    let mut feeds: Vec<&Feed> = site.feeds.values().collect();
    feeds.sort_by(|a, b| a.url.cmp(&b.url));
    json!({
        "host": site.host,
        "last_seen": site.last_seen.map(|d| d.to_rfc3339()),
        "feeds": feeds.into_iter().map(serialize_feed).collect::<Vec<_>>(),
    })
}
