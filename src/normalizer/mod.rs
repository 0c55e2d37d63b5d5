use chrono::Utc;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{FreshetError, Result};
use crate::domain::{Entry, Feed, FeedWithEntries};

/// Converts raw RSS/Atom bytes into domain records. Entries without a usable
/// URL are skipped: the URL is the identity everything downstream keys on.
#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, feed_url: &str, body: &[u8]) -> Result<FeedWithEntries> {
        let parsed = parser::parse(body).map_err(|e| FreshetError::FeedParse(e.to_string()))?;

        let mut feed = Feed::new(feed_url.to_string());
        feed.title = parsed
            .title
            .map(|t| decode_html_entities(&t.content).to_string())
            .unwrap_or_default();
        feed.website = parsed
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();
        feed.description = parsed
            .description
            .map(|d| decode_html_entities(&d.content).to_string());
        feed.last_updated = Some(Utc::now());

        let entries: Vec<Entry> = parsed
            .entries
            .into_iter()
            .filter_map(|parsed_entry| {
                let link = parsed_entry.links.first().map(|l| l.href.clone());
                let url = match link {
                    Some(url) if !url.is_empty() => url,
                    _ if !parsed_entry.id.is_empty() => parsed_entry.id.clone(),
                    _ => return None,
                };

                let mut entry = Entry::new(url, feed_url.to_string());
                entry.title = parsed_entry
                    .title
                    .map(|t| decode_html_entities(&t.content).to_string())
                    .unwrap_or_default();
                entry.website = feed.website.clone();
                entry.content = parsed_entry
                    .content
                    .and_then(|c| c.body)
                    .map(|b| decode_html_entities(&b).to_string())
                    .or_else(|| {
                        parsed_entry
                            .summary
                            .map(|s| decode_html_entities(&s.content).to_string())
                    });
                entry.published = parsed_entry
                    .published
                    .or(parsed_entry.updated)
                    .map(|dt| dt.with_timezone(&Utc));
                entry.image = parsed_entry
                    .media
                    .first()
                    .and_then(|m| m.thumbnails.first().map(|t| t.image.uri.clone()))
                    .or_else(|| {
                        parsed_entry
                            .media
                            .first()
                            .and_then(|m| m.content.first())
                            .and_then(|c| c.url.as_ref().map(|u| u.to_string()))
                    });

                Some(entry)
            })
            .collect();

        Ok(FeedWithEntries { feed, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <link>https://example.com</link>
    <description>A test feed</description>
    <item>
      <title>Big &amp; Bold News</title>
      <link>https://example.com/item1</link>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>This is item 1</description>
    </item>
    <item>
      <title>Test Item 2</title>
      <link>https://example.com/item2</link>
      <guid>item-2</guid>
      <description>This is item 2</description>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <subtitle>An Atom test feed</subtitle>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <summary>This is Atom entry 1</summary>
  </entry>
</feed>"#;

    #[test]
    fn parse_rss() {
        let result = Normalizer::new()
            .normalize("https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(result.feed.title, "Test Feed");
        assert_eq!(result.feed.website, "https://example.com");
        assert_eq!(result.feed.description, Some("A test feed".into()));
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].url, "https://example.com/item1");
        assert_eq!(result.entries[0].title, "Big & Bold News");
        assert!(result.entries[0].published.is_some());
        assert!(result.entries[1].published.is_none());
    }

    #[test]
    fn parse_atom() {
        let result = Normalizer::new()
            .normalize("https://example.com/feed.atom", ATOM_SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(result.feed.title, "Atom Test Feed");
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].url, "https://example.com/atom1");
        assert_eq!(
            result.entries[0].content,
            Some("This is Atom entry 1".into())
        );
    }

    #[test]
    fn entries_start_unread_and_unstarred() {
        let result = Normalizer::new()
            .normalize("https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();
        assert!(result.entries.iter().all(|e| !e.is_read && !e.is_starred));
    }

    #[test]
    fn garbage_input_is_a_parse_error() {
        let err = Normalizer::new()
            .normalize("https://example.com/feed.xml", b"not a feed")
            .unwrap_err();
        assert!(matches!(err, FreshetError::FeedParse(_)));
    }
}
