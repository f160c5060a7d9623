//! Feed Scorer: a pure function assigning an integer score to a feed given
//! the query root host. Ported from the source's `score_item`.

use crate::model::Feed;
use url::Url;

const KEYWORDS: &[(&str, i32)] = &[("atom", 10), ("rss", 8), (".xml", 6), ("feed", 4), ("rdf", 2)];

/// Score `feed` against `query_host` and write the result into
/// `feed.score`.
pub fn score_feed(feed: &mut Feed, query_host: &str) {
    let Ok(url) = Url::parse(&feed.url) else {
        feed.score = 0;
        return;
    };

    let url_str = feed.url.to_lowercase();
    let title_lower = feed.title.as_deref().unwrap_or("").to_lowercase();
    let mut score: i32 = 0;

    // -- decrements --
    let host = url.host_str().unwrap_or("");
    if !query_host.is_empty() && !host.contains(query_host) {
        score -= 20;
    }

    let parts_len = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).count())
        .unwrap_or(0);
    if parts_len > 2 {
        score -= (parts_len as i32 - 2) * 2;
    }

    if feed.bozo != 0 {
        score -= 20;
    }
    if feed.description.as_deref().unwrap_or("").is_empty() {
        score -= 10;
    }
    if url_str.contains("georss") {
        score -= 10;
    }
    if url_str.contains("alt") {
        score -= 7;
    }
    if url_str.contains("feedburner") {
        score -= 10;
    }

    // -- increments --
    if url.scheme() == "https" {
        score += 10;
    }
    if feed.is_push {
        score += 10;
    }
    if url_str.contains("index") {
        score += 30;
    }

    if url_str.contains("comments") || title_lower.contains("comments") {
        score -= 15;
    } else {
        score += feed.velocity.floor() as i32;
    }

    if ["/home", "/top", "/most", "/magazine"]
        .iter()
        .any(|kw| url_str.contains(kw))
    {
        score += 10;
    }

    for (kw, bonus) in KEYWORDS {
        if url_str.contains(kw) {
            score += bonus;
        }
    }

    feed.score = score;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_feed(url: &str) -> Feed {
        Feed {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn is_deterministic_and_pure() {
        let mut a = base_feed("https://example.com/feed.xml");
        let mut b = a.clone();
        score_feed(&mut a, "example.com");
        score_feed(&mut b, "example.com");
        assert_eq!(a.score, b.score);
    }

    #[test]
    fn rewards_https_and_keyword() {
        let mut feed = base_feed("https://example.com/feed.xml");
        feed.description = Some("d".to_string());
        score_feed(&mut feed, "example.com");
        // +10 https, +6 .xml keyword, +4 feed keyword = 20, minus nothing else
        assert_eq!(feed.score, 20);
    }

    #[test]
    fn penalizes_mismatched_host() {
        let mut feed = base_feed("http://other.com/feed.xml");
        feed.description = Some("d".to_string());
        score_feed(&mut feed, "example.com");
        assert!(feed.score < 0);
    }

    #[test]
    fn penalizes_bozo_and_empty_description() {
        let mut feed = base_feed("http://example.com/feed.xml");
        feed.bozo = 1;
        score_feed(&mut feed, "example.com");
        assert!(feed.score < 0);
    }

    #[test]
    fn comments_penalty_excludes_velocity_bonus() {
        let mut feed = base_feed("http://example.com/comments.xml");
        feed.description = Some("d".to_string());
        feed.velocity = 5.0;
        score_feed(&mut feed, "example.com");
        let mut other = base_feed("http://example.com/posts.xml");
        other.description = Some("d".to_string());
        other.velocity = 5.0;
        score_feed(&mut other, "example.com");
        assert!(feed.score < other.score);
    }
}
