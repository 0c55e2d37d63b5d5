use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One article belonging to a feed. The entry URL is the sole identity: two
/// fetches describing the same URL are the same logical entry regardless of
/// how the other fields drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub url: String,
    pub feed_url: String,
    pub title: String,
    pub website: String,
    pub content: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub image: Option<String>,
    /// Owner-local state. Never overwritten by reconciliation.
    pub is_read: bool,
    /// Owner-local state. Never overwritten by reconciliation.
    pub is_starred: bool,
}

impl Entry {
    pub fn new(url: String, feed_url: String) -> Self {
        Self {
            url,
            feed_url,
            title: String::new(),
            website: String::new(),
            content: None,
            published: None,
            image: None,
            is_read: false,
            is_starred: false,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    /// Fetched-content equality: the fields reconciliation compares to decide
    /// whether a stored entry needs updating. Excludes read/starred.
    pub fn same_content_as(&self, other: &Entry) -> bool {
        self.title == other.title
            && self.content == other.content
            && self.published == other.published
            && self.image == other.image
    }
}

/// Read-only projection of an [`Entry`] for list display. Derived, never
/// persisted, regenerated on every pipeline recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryMinimal {
    pub url: String,
    pub title: String,
    pub website: String,
    pub published: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub is_read: bool,
    pub is_starred: bool,
}

impl From<&Entry> for EntryMinimal {
    fn from(entry: &Entry) -> Self {
        Self {
            url: entry.url.clone(),
            title: entry.title.clone(),
            website: entry.website.clone(),
            published: entry.published,
            image: entry.image.clone(),
            is_read: entry.is_read,
            is_starred: entry.is_starred,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str) -> Entry {
        Entry::new(url.into(), "https://example.com/feed.xml".into())
    }

    #[test]
    fn display_title_without_title() {
        assert_eq!(entry("https://example.com/a").display_title(), "(Untitled)");
    }

    #[test]
    fn same_content_ignores_flags() {
        let a = entry("https://example.com/a");
        let mut b = a.clone();
        b.is_read = true;
        b.is_starred = true;
        assert!(a.same_content_as(&b));
    }

    #[test]
    fn same_content_detects_field_drift() {
        let a = entry("https://example.com/a");

        let mut changed = a.clone();
        changed.title = "New Title".into();
        assert!(!a.same_content_as(&changed));

        let mut changed = a.clone();
        changed.content = Some("body".into());
        assert!(!a.same_content_as(&changed));

        let mut changed = a.clone();
        changed.image = Some("https://example.com/thumb.png".into());
        assert!(!a.same_content_as(&changed));
    }

    #[test]
    fn minimal_projection_carries_flags() {
        let mut e = entry("https://example.com/a");
        e.title = "A".into();
        e.is_starred = true;

        let minimal = EntryMinimal::from(&e);
        assert_eq!(minimal.url, e.url);
        assert_eq!(minimal.title, "A");
        assert!(minimal.is_starred);
        assert!(!minimal.is_read);
    }
}
