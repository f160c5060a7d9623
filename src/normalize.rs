//! URL Normalizer: parse, coerce, and validate query strings into canonical
//! absolute URLs, and compute root hosts.

use crate::error::Error;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

// Mirrors the source's `valid_url_regex`: must contain a `label.label` shape
// with at least 2 alphanumerics per label, optionally prefixed by a scheme.
static VALID_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^((?:https?|feed)://)?[\w.-]{2,255}(?:\.[\w.-]{1,255}){1,12}[\w\-._~:/?#\[\]@!$&'()*+,;=]*$")
        .expect("valid_url_regex")
});

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z]{2,5}://").expect("scheme_regex"));

static SUBDOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(feeds?|www|rss|api)\.").expect("subdomain_regex"));

/// Remove a leading `scheme://` (case-insensitive) from a URL string.
pub fn remove_scheme(url: &str) -> String {
    SCHEME_RE.replace(url.trim(), "").into_owned()
}

/// Strip a single leading feed-ish label (`feeds`, `feed`, `www`, `rss`,
/// `api`) when the host has at least 3 dot-labels; otherwise return
/// unchanged.
pub fn root_host(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() > 2 {
        SUBDOMAIN_RE.replace(host, "").into_owned()
    } else {
        host.to_string()
    }
}

/// True if the URL's path, stripped of leading/trailing `/`, is non-empty.
pub fn has_path(url: &Url) -> bool {
    !url.path().trim_matches('/').is_empty()
}

/// Coerce a raw string to an absolute URL. Defaults to scheme `http` unless
/// `https` coercion is requested. Leading `:/` is stripped before the
/// scheme is prepended.
pub fn coerce_url(raw: &str, https: bool) -> Result<Url, Error> {
    let trimmed = raw.trim();
    let scheme = if https { "https" } else { "http" };

    if let Ok(parsed) = Url::parse(trimmed) {
        if parsed.cannot_be_a_base() {
            // Not an absolute hierarchical URL (e.g. "mailto:x"); treat as
            // schemeless input instead.
        } else {
            if parsed.scheme() == "http" && https {
                let mut with_scheme = parsed.clone();
                let _ = with_scheme.set_scheme("https");
                return Ok(with_scheme);
            }
            return Ok(parsed);
        }
    }

    let stripped = trimmed.trim_start_matches([':', '/']);
    let candidate = format!("{scheme}://{stripped}");
    Url::parse(&candidate)
        .map_err(|e| Error::BadRequest(format!("Invalid URL: Unable to parse '{raw}' as a URL: {e}")))
}

/// Validate the query string as a URL, returning the coerced absolute URL.
pub fn validate_query(query: &str) -> Result<Url, Error> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::BadRequest("No URL in Request".to_string()));
    }

    if !VALID_URL_RE.is_match(query) {
        return Err(Error::BadRequest(format!(
            "Invalid URL: '{query}' is not supported as a searchable URL."
        )));
    }

    let url = coerce_url(query, false)?;

    if url.host_str().is_none() || url.host_str() == Some("") {
        return Err(Error::BadRequest(format!(
            "Invalid URL: Unable to parse '{query}' as a URL."
        )));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_input() {
        let err = validate_query("").unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn rejects_unshaped_input() {
        let err = validate_query("not_a_url").unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn defaults_to_http_scheme() {
        let url = validate_query("example.com").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn keeps_explicit_https() {
        let url = validate_query("https://example.com/blog").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.path(), "/blog");
    }

    #[test]
    fn coerce_url_is_idempotent() {
        let once = coerce_url("example.com", false).unwrap();
        let twice = coerce_url(once.as_str(), false).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn root_host_strips_leading_feed_label() {
        assert_eq!(root_host("feeds.example.com"), "example.com");
        assert_eq!(root_host("www.example.com"), "example.com");
        assert_eq!(root_host("rss.example.com"), "example.com");
        assert_eq!(root_host("api.example.com"), "example.com");
    }

    #[test]
    fn root_host_leaves_two_label_hosts_alone() {
        assert_eq!(root_host("example.com"), "example.com");
        assert_eq!(root_host("www.com"), "www.com");
    }

    #[test]
    fn root_host_is_idempotent() {
        let h = "feeds.example.com";
        assert_eq!(root_host(&root_host(h)), root_host(h));
    }

    #[test]
    fn has_path_matches_spec_examples() {
        let a = Url::parse("https://a.com").unwrap();
        let b = Url::parse("https://a.com/").unwrap();
        let c = Url::parse("https://a.com/x").unwrap();
        assert!(!has_path(&a));
        assert!(!has_path(&b));
        assert!(has_path(&c));
    }

    #[test]
    fn remove_scheme_strips_case_insensitively() {
        assert_eq!(remove_scheme("HTTPS://example.com"), "example.com");
        assert_eq!(remove_scheme("feed://example.com/rss"), "example.com/rss");
    }
}
