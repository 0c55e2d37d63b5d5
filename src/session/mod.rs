pub mod pipeline;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use crate::app::Result;
use crate::domain::{Entry, EntryMinimal, Feed, FeedWithEntries};
use crate::fetcher::Fetcher;
use crate::reconcile::{StoreApplier, UpdateReconciler};
use crate::store::{Store, StoreEvent};

pub use pipeline::{FilterMode, SortOrder};

/// Lifecycle of the most recent refresh request, observable by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Updating,
    Done {
        added: usize,
        updated: usize,
    },
    Failed(String),
}

struct FetchOutcome {
    generation: u64,
    result: Result<FeedWithEntries>,
}

/// View-model for one feed's entry list and reading view.
///
/// One session per active feed view. Raw entries flow in from the store and
/// through the filter → query → project → sort pipeline; the resulting
/// minimal list, the feed record, and the fetch lifecycle are published on
/// watch channels. All mutations go through the store, whose change events
/// drive recomputation.
pub struct EntryListSession {
    store: Arc<dyn Store + Send + Sync>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    feed_url: String,
    reconciler: UpdateReconciler,
    raw_entries: Vec<Entry>,
    filter: FilterMode,
    query: String,
    order: SortOrder,
    /// Single-shot guard: reconciliation runs only for an explicitly
    /// requested fetch, never for an incidental store emission.
    update_was_requested: bool,
    /// A newer refresh supersedes an in-flight one; results carrying a stale
    /// generation are discarded on arrival.
    fetch_generation: u64,
    fetch_tx: mpsc::Sender<FetchOutcome>,
    fetch_rx: mpsc::Receiver<FetchOutcome>,
    store_rx: broadcast::Receiver<StoreEvent>,
    entries_tx: watch::Sender<Vec<EntryMinimal>>,
    feed_tx: watch::Sender<Option<Feed>>,
    fetch_state_tx: watch::Sender<FetchState>,
}

impl EntryListSession {
    pub fn new(
        store: Arc<dyn Store + Send + Sync>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        feed_url: String,
        filter: FilterMode,
        order: SortOrder,
    ) -> Result<Self> {
        let (fetch_tx, fetch_rx) = mpsc::channel(4);
        let store_rx = store.subscribe();
        let (entries_tx, _) = watch::channel(Vec::new());
        let (feed_tx, _) = watch::channel(None);
        let (fetch_state_tx, _) = watch::channel(FetchState::Idle);

        let mut session = Self {
            store,
            fetcher,
            feed_url,
            reconciler: UpdateReconciler::new(),
            raw_entries: Vec::new(),
            filter,
            query: String::new(),
            order,
            update_was_requested: false,
            fetch_generation: 0,
            fetch_tx,
            fetch_rx,
            store_rx,
            entries_tx,
            feed_tx,
            fetch_state_tx,
        };
        session.reload_from_store()?;
        Ok(session)
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    // Observable outputs.

    pub fn subscribe_entries(&self) -> watch::Receiver<Vec<EntryMinimal>> {
        self.entries_tx.subscribe()
    }

    pub fn subscribe_feed(&self) -> watch::Receiver<Option<Feed>> {
        self.feed_tx.subscribe()
    }

    pub fn subscribe_fetch_state(&self) -> watch::Receiver<FetchState> {
        self.fetch_state_tx.subscribe()
    }

    /// The currently displayed minimal list.
    pub fn displayed(&self) -> Vec<EntryMinimal> {
        self.entries_tx.borrow().clone()
    }

    pub fn feed(&self) -> Option<Feed> {
        self.feed_tx.borrow().clone()
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetch_state_tx.borrow().clone()
    }

    pub fn all_read(&self) -> bool {
        pipeline::all_read(&self.entries_tx.borrow())
    }

    pub fn all_starred(&self) -> bool {
        pipeline::all_starred(&self.entries_tx.borrow())
    }

    // Pipeline parameters.

    /// Re-runs the pipeline from stage 1 over the cached raw set.
    pub fn set_filter(&mut self, filter: FilterMode) {
        self.filter = filter;
        self.recompute();
    }

    /// Re-runs the pipeline from stage 1 over the cached raw set.
    pub fn submit_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.recompute();
    }

    /// Re-sorts the last computed minimal list without re-filtering.
    pub fn set_order(&mut self, order: SortOrder) {
        self.order = order;
        let current = self.entries_tx.borrow().clone();
        self.entries_tx
            .send_replace(pipeline::sort_minimal(current, order));
    }

    // Refresh.

    /// Fire-and-forget fetch request. Marks the session as updating; the
    /// eventual result is applied via [`pump`](Self::pump) or
    /// [`poll_fetch`](Self::poll_fetch). Requesting again before completion
    /// supersedes the earlier request.
    pub fn request_refresh(&mut self) {
        self.update_was_requested = true;
        self.fetch_generation += 1;
        self.fetch_state_tx.send_replace(FetchState::Updating);

        let generation = self.fetch_generation;
        let fetcher = self.fetcher.clone();
        let url = self.feed_url.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = fetcher.request_feed(&url).await;
            // The session may be gone by now; a dead channel is fine.
            let _ = tx.send(FetchOutcome { generation, result }).await;
        });
    }

    /// Drain pending store events and fetch outcomes. Returns true if any
    /// observable output may have changed. Intended for UI tick loops.
    pub fn pump(&mut self) -> Result<bool> {
        let mut changed = false;

        loop {
            match self.store_rx.try_recv() {
                Ok(event) => {
                    if event.feed_url == self.feed_url {
                        self.reload_from_store()?;
                        changed = true;
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => {
                    // Missed events; a reload covers whatever they carried.
                    self.reload_from_store()?;
                    changed = true;
                }
                Err(_) => break,
            }
        }

        while let Ok(outcome) = self.fetch_rx.try_recv() {
            self.apply_fetch_outcome(outcome)?;
            changed = true;
        }

        Ok(changed)
    }

    /// Await the next fetch outcome and apply it. Resolves to false if the
    /// fetch channel is closed.
    pub async fn poll_fetch(&mut self) -> Result<bool> {
        match self.fetch_rx.recv().await {
            Some(outcome) => {
                self.apply_fetch_outcome(outcome)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn apply_fetch_outcome(&mut self, outcome: FetchOutcome) -> Result<()> {
        if outcome.generation != self.fetch_generation {
            tracing::debug!(feed = %self.feed_url, "discarding superseded fetch result");
            return Ok(());
        }

        match outcome.result {
            Err(e) => {
                tracing::warn!(feed = %self.feed_url, error = %e, "feed refresh failed");
                self.fetch_state_tx
                    .send_replace(FetchState::Failed(e.to_string()));
            }
            Ok(fetched) if self.update_was_requested => {
                self.update_was_requested = false;
                let mut applier = StoreApplier::new(self.store.as_ref());
                self.reconciler
                    .submit_new_data(fetched.feed, fetched.entries, &mut applier)?;
                let (added, updated) = applier.counts();
                self.fetch_state_tx
                    .send_replace(FetchState::Done { added, updated });
                self.reload_from_store()?;
            }
            Ok(_) => {
                // A result without a pending request is ordinary data noise.
                self.fetch_state_tx.send_replace(FetchState::Idle);
            }
        }

        Ok(())
    }

    // Actions over the displayed list.

    /// Toggle semantics: if not every displayed entry is starred, star them
    /// all; otherwise unstar them all. Operates on the visible subset only.
    pub fn star_all_current(&mut self) -> Result<()> {
        let displayed = self.displayed();
        let target = !pipeline::all_starred(&displayed);
        let urls: Vec<String> = displayed.into_iter().map(|e| e.url).collect();
        self.store.update_entries_starred(&urls, target)?;
        self.reload_from_store()
    }

    /// Toggle semantics over the visible subset, as with
    /// [`star_all_current`](Self::star_all_current).
    pub fn mark_all_current_read(&mut self) -> Result<()> {
        let displayed = self.displayed();
        let target = !pipeline::all_read(&displayed);
        let urls: Vec<String> = displayed.into_iter().map(|e| e.url).collect();
        self.store.update_entries_read(&urls, target)?;
        self.reload_from_store()
    }

    pub fn set_entry_starred(&mut self, entry_url: &str, is_starred: bool) -> Result<()> {
        self.store
            .update_entries_starred(&[entry_url.to_string()], is_starred)?;
        self.reload_from_store()
    }

    pub fn set_entry_read(&mut self, entry_url: &str, is_read: bool) -> Result<()> {
        self.store
            .update_entries_read(&[entry_url.to_string()], is_read)?;
        self.reload_from_store()
    }

    /// Assign a category to the loaded feed. An empty string clears it.
    pub fn update_category(&mut self, category: &str) -> Result<()> {
        if self.feed_tx.borrow().is_none() {
            return Ok(());
        }
        let category = if category.is_empty() {
            None
        } else {
            Some(category)
        };
        self.store.update_feed_category(&self.feed_url, category)?;
        self.reload_from_store()
    }

    /// Unsubscribe. No loaded feed is a no-op, not an error.
    pub fn delete_feed_and_entries(&mut self) -> Result<()> {
        if self.feed_tx.borrow().is_none() {
            return Ok(());
        }
        self.store.delete_feed_and_entries(&self.feed_url)?;
        self.reload_from_store()
    }

    // Internals.

    fn reload_from_store(&mut self) -> Result<()> {
        let feed = self.store.get_feed(&self.feed_url)?;
        self.raw_entries = self.store.get_entries_by_feed(&self.feed_url)?;

        // Arm the reconciliation baseline; no-ops while one is already held.
        if let Some(ref feed) = feed {
            self.reconciler.submit_initial_feed(feed);
        }
        self.reconciler.submit_initial_entries(&self.raw_entries);

        self.feed_tx.send_replace(feed);
        self.recompute();
        Ok(())
    }

    fn recompute(&mut self) {
        let filtered = pipeline::filter_entries(&self.raw_entries, self.filter);
        let queried = pipeline::query_entries(filtered, &self.query);
        let minimal = pipeline::sort_minimal(pipeline::to_minimal(&queried), self.order);
        self.entries_tx.send_replace(minimal);
    }
}
