use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};
use tokio::sync::broadcast;

use crate::app::{FreshetError, Result};
use crate::domain::{Entry, Feed};
use crate::store::{Store, StoreEvent};

const EVENT_CHANNEL_CAPACITY: usize = 64;

pub struct SqliteStore {
    conn: Mutex<Connection>,
    events: broadcast::Sender<StoreEvent>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let store = Self {
            conn: Mutex::new(conn),
            events,
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock_conn()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| FreshetError::Other(format!("migration failed: {e}")))?;

        Ok(())
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            FreshetError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn notify(&self, feed_url: &str) {
        // No receivers is fine; nobody is observing yet.
        let _ = self.events.send(StoreEvent {
            feed_url: feed_url.to_string(),
        });
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn feed_from_row(row: &Row<'_>) -> rusqlite::Result<Feed> {
        Ok(Feed {
            url: row.get(0)?,
            title: row.get(1)?,
            website: row.get(2)?,
            description: row.get(3)?,
            category: row.get(4)?,
            unread_count: row.get(5)?,
            last_updated: row
                .get::<_, Option<String>>(6)?
                .and_then(|s| Self::parse_datetime(&s)),
        })
    }

    fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
        Ok(Entry {
            url: row.get(0)?,
            feed_url: row.get(1)?,
            title: row.get(2)?,
            website: row.get(3)?,
            content: row.get(4)?,
            published: row
                .get::<_, Option<String>>(5)?
                .and_then(|s| Self::parse_datetime(&s)),
            image: row.get(6)?,
            is_read: row.get::<_, i32>(7)? != 0,
            is_starred: row.get::<_, i32>(8)? != 0,
        })
    }
}

const FEED_COLUMNS: &str =
    "url, title, website, description, category, unread_count, last_updated";
const ENTRY_COLUMNS: &str =
    "url, feed_url, title, website, content, published, image, is_read, is_starred";

impl Store for SqliteStore {
    fn add_feed(&self, feed: &Feed) -> Result<()> {
        {
            let conn = self.lock_conn()?;
            conn.execute(
                "INSERT INTO feeds (url, title, website, description, category, unread_count, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    feed.url,
                    feed.title,
                    feed.website,
                    feed.description,
                    feed.category,
                    feed.unread_count,
                    feed.last_updated.map(|dt| dt.to_rfc3339()),
                ],
            )?;
        }
        self.notify(&feed.url);
        Ok(())
    }

    fn get_feed(&self, feed_url: &str) -> Result<Option<Feed>> {
        let conn = self.lock_conn()?;
        let result = conn
            .query_row(
                &format!("SELECT {FEED_COLUMNS} FROM feeds WHERE url = ?1"),
                params![feed_url],
                Self::feed_from_row,
            )
            .optional()?;
        Ok(result)
    }

    fn get_all_feeds(&self) -> Result<Vec<Feed>> {
        let conn = self.lock_conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {FEED_COLUMNS} FROM feeds ORDER BY title, url"))?;
        let feeds = stmt
            .query_map([], Self::feed_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(feeds)
    }

    fn update_feed(&self, feed: &Feed) -> Result<()> {
        {
            let conn = self.lock_conn()?;
            conn.execute(
                "UPDATE feeds SET title = ?2, website = ?3, description = ?4, category = ?5,
                     unread_count = ?6, last_updated = ?7
                 WHERE url = ?1",
                params![
                    feed.url,
                    feed.title,
                    feed.website,
                    feed.description,
                    feed.category,
                    feed.unread_count,
                    feed.last_updated.map(|dt| dt.to_rfc3339()),
                ],
            )?;
        }
        self.notify(&feed.url);
        Ok(())
    }

    fn update_feed_unread_count(&self, feed_url: &str, unread_count: i64) -> Result<()> {
        {
            let conn = self.lock_conn()?;
            conn.execute(
                "UPDATE feeds SET unread_count = ?2 WHERE url = ?1",
                params![feed_url, unread_count],
            )?;
        }
        self.notify(feed_url);
        Ok(())
    }

    fn update_feed_category(&self, feed_url: &str, category: Option<&str>) -> Result<()> {
        {
            let conn = self.lock_conn()?;
            conn.execute(
                "UPDATE feeds SET category = ?2 WHERE url = ?1",
                params![feed_url, category],
            )?;
        }
        self.notify(feed_url);
        Ok(())
    }

    fn delete_feed_and_entries(&self, feed_url: &str) -> Result<()> {
        {
            let conn = self.lock_conn()?;
            // Entries cascade via the foreign key.
            conn.execute("DELETE FROM feeds WHERE url = ?1", params![feed_url])?;
        }
        self.notify(feed_url);
        Ok(())
    }

    fn get_entry(&self, entry_url: &str) -> Result<Option<Entry>> {
        let conn = self.lock_conn()?;
        let result = conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE url = ?1"),
                params![entry_url],
                Self::entry_from_row,
            )
            .optional()?;
        Ok(result)
    }

    fn get_entries_by_feed(&self, feed_url: &str) -> Result<Vec<Entry>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE feed_url = ?1
             ORDER BY published IS NULL, published DESC"
        ))?;
        let entries = stmt
            .query_map(params![feed_url], Self::entry_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn refresh_entries(
        &self,
        to_add: &[Entry],
        to_update: &[Entry],
        to_delete: &[Entry],
        feed_url: &str,
    ) -> Result<()> {
        {
            let mut conn = self.lock_conn()?;
            let tx = conn.transaction()?;

            for entry in to_add.iter().chain(to_update) {
                tx.execute(
                    "INSERT INTO entries (url, feed_url, title, website, content, published, image, is_read, is_starred)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT(url) DO UPDATE SET
                         title = ?3, website = ?4, content = ?5, published = ?6, image = ?7,
                         is_read = ?8, is_starred = ?9",
                    params![
                        entry.url,
                        entry.feed_url,
                        entry.title,
                        entry.website,
                        entry.content,
                        entry.published.map(|dt| dt.to_rfc3339()),
                        entry.image,
                        entry.is_read as i32,
                        entry.is_starred as i32,
                    ],
                )?;
            }

            for entry in to_delete {
                tx.execute("DELETE FROM entries WHERE url = ?1", params![entry.url])?;
            }

            tx.commit()?;
        }
        self.notify(feed_url);
        Ok(())
    }

    fn update_entries_starred(&self, entry_urls: &[String], is_starred: bool) -> Result<()> {
        let feed_urls = {
            let mut conn = self.lock_conn()?;
            let tx = conn.transaction()?;
            let mut feed_urls: Vec<String> = Vec::new();

            for url in entry_urls {
                tx.execute(
                    "UPDATE entries SET is_starred = ?2 WHERE url = ?1",
                    params![url, is_starred as i32],
                )?;
                let feed_url: Option<String> = tx
                    .query_row(
                        "SELECT feed_url FROM entries WHERE url = ?1",
                        params![url],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(feed_url) = feed_url {
                    if !feed_urls.contains(&feed_url) {
                        feed_urls.push(feed_url);
                    }
                }
            }

            tx.commit()?;
            feed_urls
        };

        for feed_url in feed_urls {
            self.notify(&feed_url);
        }
        Ok(())
    }

    fn update_entries_read(&self, entry_urls: &[String], is_read: bool) -> Result<()> {
        let feed_urls = {
            let mut conn = self.lock_conn()?;
            let tx = conn.transaction()?;
            let mut feed_urls: Vec<String> = Vec::new();

            for url in entry_urls {
                tx.execute(
                    "UPDATE entries SET is_read = ?2 WHERE url = ?1",
                    params![url, is_read as i32],
                )?;
                let feed_url: Option<String> = tx
                    .query_row(
                        "SELECT feed_url FROM entries WHERE url = ?1",
                        params![url],
                        |row| row.get(0),
                    )
                    .optional()?;
                if let Some(feed_url) = feed_url {
                    if !feed_urls.contains(&feed_url) {
                        feed_urls.push(feed_url);
                    }
                }
            }

            tx.commit()?;
            feed_urls
        };

        for feed_url in feed_urls {
            self.notify(&feed_url);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
