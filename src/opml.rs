//! OPML Writer: projects a feed set into an OPML 2.0 document for the
//! `opml=true` HTTP response. Grounded in the feed shapes already carried by
//! `crate::model::Feed`; the inverse (OPML parsing) is out of scope per
//! spec §1.

use crate::model::Feed;

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render `feeds` as an OPML 2.0 document, `title` naming the outline body.
pub fn write_opml(title: &str, feeds: &[Feed]) -> String {
    let mut body = String::new();
    for feed in feeds {
        let text = feed.title.as_deref().unwrap_or(&feed.url);
        body.push_str(&format!(
            "    <outline type=\"rss\" text=\"{}\" title=\"{}\" xmlUrl=\"{}\"{} />\n",
            escape_xml(text),
            escape_xml(text),
            escape_xml(&feed.url),
            feed.site_url
                .as_deref()
                .map(|u| format!(" htmlUrl=\"{}\"", escape_xml(u)))
                .unwrap_or_default(),
        ));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<opml version=\"2.0\">\n  <head>\n    <title>{}</title>\n  </head>\n  <body>\n{}  </body>\n</opml>\n",
        escape_xml(title),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_outline_per_feed() {
        let feeds = vec![Feed {
            url: "https://example.com/feed.xml".to_string(),
            title: Some("Example Feed".to_string()),
            ..Default::default()
        }];
        let xml = write_opml("example.com", &feeds);
        assert!(xml.contains("xmlUrl=\"https://example.com/feed.xml\""));
        assert!(xml.contains("text=\"Example Feed\""));
    }

    #[test]
    fn escapes_ampersands_in_titles() {
        let feeds = vec![Feed {
            url: "https://example.com/feed.xml".to_string(),
            title: Some("Tom & Jerry".to_string()),
            ..Default::default()
        }];
        let xml = write_opml("example.com", &feeds);
        assert!(xml.contains("Tom &amp; Jerry"));
    }
}
