use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Entry;

/// A subscribed content source, identified by its source URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub url: String,
    pub title: String,
    pub website: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Derived from the entry set during reconciliation; cached here so feed
    /// lists can show it without a count query.
    pub unread_count: i64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Feed {
    pub fn new(url: String) -> Self {
        Self {
            url,
            title: String::new(),
            website: String::new(),
            description: None,
            category: None,
            unread_count: 0,
            last_updated: None,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

/// One parsed fetch result: the feed's own metadata plus its entries.
#[derive(Debug, Clone)]
pub struct FeedWithEntries {
    pub feed: Feed,
    pub entries: Vec<Entry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_title_falls_back_to_url() {
        let mut feed = Feed::new("https://example.com/feed.xml".into());
        assert_eq!(feed.display_title(), "https://example.com/feed.xml");

        feed.title = "Example Feed".into();
        assert_eq!(feed.display_title(), "Example Feed");
    }
}
