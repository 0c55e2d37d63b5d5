use std::collections::HashMap;

use crate::app::Result;
use crate::domain::{Entry, Feed};
use crate::store::Store;

/// The three-way classification of a completed fetch against the stored
/// baseline. Produced once per fetch and consumed exactly once.
#[derive(Debug, Clone, Default)]
pub struct EntryDelta {
    pub feed_url: String,
    pub to_add: Vec<Entry>,
    pub to_update: Vec<Entry>,
    pub to_delete: Vec<Entry>,
}

impl EntryDelta {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Receives the outcome of a reconciliation, in a fixed order: unread count,
/// feed metadata, entry delta. Implementations typically persist each piece.
pub trait RefreshListener {
    fn on_unread_entries_counted(&mut self, feed_url: &str, unread_count: i64) -> Result<()>;
    fn on_feed_needs_refresh(&mut self, feed: &Feed) -> Result<()>;
    fn on_entries_need_refresh(&mut self, delta: EntryDelta) -> Result<()>;
}

/// A [`RefreshListener`] that persists the reconciliation outcome through
/// the store interface, keeping a tally of what changed for UI notices.
pub struct StoreApplier<'a> {
    store: &'a dyn Store,
    added: usize,
    updated: usize,
}

impl<'a> StoreApplier<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            added: 0,
            updated: 0,
        }
    }

    /// (added, updated) sizes of the last applied delta.
    pub fn counts(&self) -> (usize, usize) {
        (self.added, self.updated)
    }
}

impl RefreshListener for StoreApplier<'_> {
    fn on_unread_entries_counted(&mut self, feed_url: &str, unread_count: i64) -> Result<()> {
        self.store.update_feed_unread_count(feed_url, unread_count)
    }

    fn on_feed_needs_refresh(&mut self, feed: &Feed) -> Result<()> {
        self.store.update_feed(feed)
    }

    fn on_entries_need_refresh(&mut self, delta: EntryDelta) -> Result<()> {
        self.added = delta.to_add.len();
        self.updated = delta.to_update.len();
        self.store.refresh_entries(
            &delta.to_add,
            &delta.to_update,
            &delta.to_delete,
            &delta.feed_url,
        )
    }
}

/// Diffs a freshly fetched entry set against a snapshot of the stored one.
///
/// The baseline is an owned copy captured before the fetch completes, never a
/// live reference, so a slow fetch is always compared against the state that
/// existed when it was requested. The first submission wins; consuming a
/// reconciliation clears both snapshots so the next store emission re-arms
/// the baseline.
#[derive(Default)]
pub struct UpdateReconciler {
    current_feed: Option<Feed>,
    initial_entries: Option<Vec<Entry>>,
}

impl UpdateReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit_initial_feed(&mut self, feed: &Feed) {
        if self.current_feed.is_none() {
            self.current_feed = Some(feed.clone());
        }
    }

    pub fn submit_initial_entries(&mut self, entries: &[Entry]) {
        if self.initial_entries.is_none() {
            self.initial_entries = Some(entries.to_vec());
        }
    }

    /// Classify `new_entries` against the snapshot and report the outcome.
    ///
    /// Every entry in either set lands in exactly one of {added, updated,
    /// unchanged, deleted}. Updated entries keep the stored read/starred
    /// flags; added entries are unread by default. A fetch with zero entries
    /// is valid and deletes the whole snapshot.
    pub fn submit_new_data(
        &mut self,
        new_feed: Feed,
        new_entries: Vec<Entry>,
        listener: &mut dyn RefreshListener,
    ) -> Result<()> {
        let snapshot = self.initial_entries.take().unwrap_or_default();
        let stored_by_url: HashMap<&str, &Entry> =
            snapshot.iter().map(|e| (e.url.as_str(), e)).collect();

        let mut to_add = Vec::new();
        let mut to_update = Vec::new();
        let mut unchanged = Vec::new();

        for mut incoming in new_entries {
            match stored_by_url.get(incoming.url.as_str()) {
                None => {
                    incoming.is_read = false;
                    incoming.is_starred = false;
                    to_add.push(incoming);
                }
                Some(stored) if !stored.same_content_as(&incoming) => {
                    incoming.is_read = stored.is_read;
                    incoming.is_starred = stored.is_starred;
                    to_update.push(incoming);
                }
                Some(stored) => unchanged.push((*stored).clone()),
            }
        }

        let seen: HashMap<&str, ()> = to_add
            .iter()
            .chain(&to_update)
            .chain(&unchanged)
            .map(|e| (e.url.as_str(), ()))
            .collect();
        let to_delete: Vec<Entry> = snapshot
            .iter()
            .filter(|e| !seen.contains_key(e.url.as_str()))
            .cloned()
            .collect();

        let unread_count = to_add
            .iter()
            .chain(&to_update)
            .chain(&unchanged)
            .filter(|e| !e.is_read)
            .count() as i64;

        tracing::debug!(
            feed = %new_feed.url,
            added = to_add.len(),
            updated = to_update.len(),
            deleted = to_delete.len(),
            unread = unread_count,
            "reconciled fetch result"
        );

        let mut refreshed_feed = match self.current_feed.take() {
            Some(mut stored_feed) => {
                stored_feed.title = new_feed.title;
                stored_feed.website = new_feed.website;
                stored_feed.description = new_feed.description;
                stored_feed.last_updated = new_feed.last_updated;
                stored_feed
            }
            None => new_feed,
        };
        refreshed_feed.unread_count = unread_count;

        listener.on_unread_entries_counted(&refreshed_feed.url, unread_count)?;
        listener.on_feed_needs_refresh(&refreshed_feed)?;
        listener.on_entries_need_refresh(EntryDelta {
            feed_url: refreshed_feed.url.clone(),
            to_add,
            to_update,
            to_delete,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_URL: &str = "https://example.com/feed.xml";

    fn feed() -> Feed {
        let mut feed = Feed::new(FEED_URL.into());
        feed.title = "Example".into();
        feed
    }

    fn entry(url: &str, read: bool, starred: bool) -> Entry {
        let mut entry = Entry::new(url.into(), FEED_URL.into());
        entry.title = format!("Title of {url}");
        entry.is_read = read;
        entry.is_starred = starred;
        entry
    }

    /// Collects listener callbacks for assertions.
    #[derive(Default)]
    struct Recorder {
        unread: Option<i64>,
        feed: Option<Feed>,
        delta: Option<EntryDelta>,
        calls: Vec<&'static str>,
    }

    impl RefreshListener for Recorder {
        fn on_unread_entries_counted(&mut self, _feed_url: &str, count: i64) -> Result<()> {
            self.unread = Some(count);
            self.calls.push("unread");
            Ok(())
        }

        fn on_feed_needs_refresh(&mut self, feed: &Feed) -> Result<()> {
            self.feed = Some(feed.clone());
            self.calls.push("feed");
            Ok(())
        }

        fn on_entries_need_refresh(&mut self, delta: EntryDelta) -> Result<()> {
            self.delta = Some(delta);
            self.calls.push("entries");
            Ok(())
        }
    }

    fn reconcile(stored: Vec<Entry>, fetched: Vec<Entry>) -> Recorder {
        let mut reconciler = UpdateReconciler::new();
        reconciler.submit_initial_feed(&feed());
        reconciler.submit_initial_entries(&stored);

        let mut recorder = Recorder::default();
        reconciler
            .submit_new_data(feed(), fetched, &mut recorder)
            .unwrap();
        recorder
    }

    #[test]
    fn identical_data_is_a_no_op_delta() {
        let stored = vec![
            entry("https://example.com/a", false, false),
            entry("https://example.com/b", true, true),
        ];
        let recorder = reconcile(stored.clone(), stored);

        let delta = recorder.delta.unwrap();
        assert!(delta.is_empty());
        assert_eq!(recorder.unread, Some(1));
    }

    #[test]
    fn notifications_arrive_in_order() {
        let recorder = reconcile(vec![], vec![]);
        assert_eq!(recorder.calls, vec!["unread", "feed", "entries"]);
    }

    #[test]
    fn every_entry_lands_in_exactly_one_class() {
        let stored = vec![
            entry("https://example.com/kept", false, false),
            entry("https://example.com/changed", true, false),
            entry("https://example.com/gone", false, false),
        ];
        let mut changed = entry("https://example.com/changed", false, false);
        changed.title = "Rewritten".into();
        let fetched = vec![
            entry("https://example.com/kept", false, false),
            changed,
            entry("https://example.com/fresh", false, false),
        ];

        let delta = reconcile(stored, fetched).delta.unwrap();

        let added: Vec<&str> = delta.to_add.iter().map(|e| e.url.as_str()).collect();
        let updated: Vec<&str> = delta.to_update.iter().map(|e| e.url.as_str()).collect();
        let deleted: Vec<&str> = delta.to_delete.iter().map(|e| e.url.as_str()).collect();

        assert_eq!(added, vec!["https://example.com/fresh"]);
        assert_eq!(updated, vec!["https://example.com/changed"]);
        assert_eq!(deleted, vec!["https://example.com/gone"]);

        // No URL in two classes.
        for url in &added {
            assert!(!updated.contains(url) && !deleted.contains(url));
        }
        for url in &updated {
            assert!(!deleted.contains(url));
        }
    }

    #[test]
    fn update_preserves_stored_flags() {
        let stored = vec![entry("https://example.com/a", true, true)];
        let mut fetched = entry("https://example.com/a", false, false);
        fetched.title = "Rewritten".into();

        let delta = reconcile(stored, vec![fetched]).delta.unwrap();
        assert_eq!(delta.to_update.len(), 1);
        assert!(delta.to_update[0].is_read);
        assert!(delta.to_update[0].is_starred);
        assert_eq!(delta.to_update[0].title, "Rewritten");
    }

    #[test]
    fn added_entries_are_unread_even_if_fetch_says_otherwise() {
        let mut fetched = entry("https://example.com/new", false, false);
        fetched.is_read = true;
        fetched.is_starred = true;

        let recorder = reconcile(vec![], vec![fetched]);
        let delta = recorder.delta.unwrap();
        assert!(!delta.to_add[0].is_read);
        assert!(!delta.to_add[0].is_starred);
        assert_eq!(recorder.unread, Some(1));
    }

    #[test]
    fn empty_fetch_deletes_whole_snapshot() {
        let stored = vec![
            entry("https://example.com/a", false, false),
            entry("https://example.com/b", true, false),
        ];
        let recorder = reconcile(stored, vec![]);

        let delta = recorder.delta.unwrap();
        assert!(delta.to_add.is_empty());
        assert!(delta.to_update.is_empty());
        assert_eq!(delta.to_delete.len(), 2);
        assert_eq!(recorder.unread, Some(0));
    }

    #[test]
    fn unread_count_over_merged_set() {
        // Stored: one read (will update), one unread (unchanged), one that
        // disappears. Fetched adds one brand-new entry.
        let stored = vec![
            entry("https://example.com/read", true, false),
            entry("https://example.com/unread", false, false),
            entry("https://example.com/gone", false, false),
        ];
        let mut changed = entry("https://example.com/read", false, false);
        changed.title = "Rewritten".into();
        let fetched = vec![
            changed,
            entry("https://example.com/unread", false, false),
            entry("https://example.com/new", false, false),
        ];

        let recorder = reconcile(stored, fetched);
        // unread = unchanged-unread (1) + added (1); the updated one keeps read=true.
        assert_eq!(recorder.unread, Some(2));
    }

    #[test]
    fn stored_a_b_fetched_a_c() {
        let stored = vec![
            entry("https://example.com/A", false, false),
            entry("https://example.com/B", true, true),
        ];
        let fetched = vec![
            entry("https://example.com/A", false, false),
            entry("https://example.com/C", false, false),
        ];

        let recorder = reconcile(stored, fetched);
        let delta = recorder.delta.unwrap();

        assert_eq!(delta.to_add.len(), 1);
        assert_eq!(delta.to_add[0].url, "https://example.com/C");
        assert!(delta.to_update.is_empty());
        assert_eq!(delta.to_delete.len(), 1);
        assert_eq!(delta.to_delete[0].url, "https://example.com/B");
        assert_eq!(recorder.unread, Some(2));
    }

    #[test]
    fn unchanged_feed_metadata_still_emits() {
        let recorder = reconcile(vec![], vec![]);
        assert_eq!(recorder.feed.unwrap().url, FEED_URL);
    }

    #[test]
    fn feed_refresh_keeps_local_category() {
        let mut reconciler = UpdateReconciler::new();
        let mut stored_feed = feed();
        stored_feed.category = Some("Tech".into());
        reconciler.submit_initial_feed(&stored_feed);
        reconciler.submit_initial_entries(&[]);

        let mut fetched_feed = feed();
        fetched_feed.title = "Renamed".into();

        let mut recorder = Recorder::default();
        reconciler
            .submit_new_data(fetched_feed, vec![], &mut recorder)
            .unwrap();

        let refreshed = recorder.feed.unwrap();
        assert_eq!(refreshed.title, "Renamed");
        assert_eq!(refreshed.category, Some("Tech".into()));
    }

    #[test]
    fn first_snapshot_submission_wins() {
        let mut reconciler = UpdateReconciler::new();
        reconciler.submit_initial_entries(&[entry("https://example.com/a", false, false)]);
        // A later emission must not replace the armed baseline.
        reconciler.submit_initial_entries(&[]);

        let mut recorder = Recorder::default();
        reconciler
            .submit_new_data(feed(), vec![], &mut recorder)
            .unwrap();

        assert_eq!(recorder.delta.unwrap().to_delete.len(), 1);
    }

    #[test]
    fn snapshot_rearms_after_consumption() {
        let mut reconciler = UpdateReconciler::new();
        reconciler.submit_initial_entries(&[entry("https://example.com/a", false, false)]);

        let mut recorder = Recorder::default();
        reconciler
            .submit_new_data(feed(), vec![], &mut recorder)
            .unwrap();

        // Consumed: the next submission is accepted as a fresh baseline.
        reconciler.submit_initial_entries(&[entry("https://example.com/b", false, false)]);
        let mut recorder = Recorder::default();
        reconciler
            .submit_new_data(feed(), vec![], &mut recorder)
            .unwrap();
        assert_eq!(
            recorder.delta.unwrap().to_delete[0].url,
            "https://example.com/b"
        );
    }
}
