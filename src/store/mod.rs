pub mod sqlite;

use tokio::sync::broadcast;

use crate::app::Result;
use crate::domain::{Entry, Feed};

pub use sqlite::SqliteStore;

/// Emitted after every committed mutation so observers can re-query instead
/// of polling. Carries the feed whose data changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub feed_url: String,
}

/// The entry record store. Batch operations are atomic: an observer never
/// sees a partially applied `refresh_entries`.
pub trait Store {
    // Feed operations
    fn add_feed(&self, feed: &Feed) -> Result<()>;
    fn get_feed(&self, feed_url: &str) -> Result<Option<Feed>>;
    fn get_all_feeds(&self) -> Result<Vec<Feed>>;
    fn update_feed(&self, feed: &Feed) -> Result<()>;
    fn update_feed_unread_count(&self, feed_url: &str, unread_count: i64) -> Result<()>;
    fn update_feed_category(&self, feed_url: &str, category: Option<&str>) -> Result<()>;
    fn delete_feed_and_entries(&self, feed_url: &str) -> Result<()>;

    // Entry operations
    fn get_entry(&self, entry_url: &str) -> Result<Option<Entry>>;
    fn get_entries_by_feed(&self, feed_url: &str) -> Result<Vec<Entry>>;
    fn refresh_entries(
        &self,
        to_add: &[Entry],
        to_update: &[Entry],
        to_delete: &[Entry],
        feed_url: &str,
    ) -> Result<()>;
    fn update_entries_starred(&self, entry_urls: &[String], is_starred: bool) -> Result<()>;
    fn update_entries_read(&self, entry_urls: &[String], is_read: bool) -> Result<()>;

    /// Subscribe to mutation notifications.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
