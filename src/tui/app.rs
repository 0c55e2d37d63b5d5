use std::collections::HashMap;

use ratatui::widgets::ListState;

use crate::domain::{Entry, EntryMinimal, Feed};
use crate::session::EntryListSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    Feeds,
    Entries,
    Reading,
}

impl ActivePane {
    pub fn next(self) -> Self {
        match self {
            ActivePane::Feeds => ActivePane::Entries,
            ActivePane::Entries => ActivePane::Reading,
            ActivePane::Reading => ActivePane::Feeds,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ActivePane::Feeds => ActivePane::Reading,
            ActivePane::Entries => ActivePane::Feeds,
            ActivePane::Reading => ActivePane::Entries,
        }
    }
}

/// Text entry targets for the one-line input prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Category,
}

pub struct TuiApp {
    pub active_pane: ActivePane,
    pub feeds: Vec<Feed>,
    /// One session per viewed feed; replaced when the selection changes.
    pub session: Option<EntryListSession>,
    pub feed_index: usize,
    pub entry_index: usize,
    /// Full record backing the reading pane.
    pub reading_entry: Option<Entry>,
    pub reading_scroll: u16,
    /// Ephemeral per-session scroll cache, keyed by entry URL. Never persisted.
    pub scroll_positions: HashMap<String, u16>,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub should_quit: bool,
    pub status_message: Option<String>,
    // Pending delete confirmation (feed title)
    pub pending_delete: Option<String>,
    pub feed_list_state: ListState,
    pub entry_list_state: ListState,
}

impl TuiApp {
    pub fn new() -> Self {
        let mut feed_list_state = ListState::default();
        feed_list_state.select(Some(0));
        let mut entry_list_state = ListState::default();
        entry_list_state.select(Some(0));

        Self {
            active_pane: ActivePane::Feeds,
            feeds: Vec::new(),
            session: None,
            feed_index: 0,
            entry_index: 0,
            reading_entry: None,
            reading_scroll: 0,
            scroll_positions: HashMap::new(),
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            should_quit: false,
            status_message: None,
            pending_delete: None,
            feed_list_state,
            entry_list_state,
        }
    }

    pub fn selected_feed(&self) -> Option<&Feed> {
        self.feeds.get(self.feed_index)
    }

    pub fn displayed_entries(&self) -> Vec<EntryMinimal> {
        self.session
            .as_ref()
            .map(|s| s.displayed())
            .unwrap_or_default()
    }

    pub fn selected_entry(&self) -> Option<EntryMinimal> {
        self.displayed_entries().get(self.entry_index).cloned()
    }

    pub fn move_up(&mut self) {
        match self.active_pane {
            ActivePane::Feeds => {
                if self.feed_index > 0 {
                    self.feed_index -= 1;
                    self.feed_list_state.select(Some(self.feed_index));
                }
            }
            ActivePane::Entries => {
                if self.entry_index > 0 {
                    self.entry_index -= 1;
                    self.entry_list_state.select(Some(self.entry_index));
                }
            }
            ActivePane::Reading => {
                self.reading_scroll = self.reading_scroll.saturating_sub(1);
            }
        }
    }

    pub fn move_down(&mut self) {
        match self.active_pane {
            ActivePane::Feeds => {
                if !self.feeds.is_empty() && self.feed_index < self.feeds.len() - 1 {
                    self.feed_index += 1;
                    self.feed_list_state.select(Some(self.feed_index));
                }
            }
            ActivePane::Entries => {
                let count = self.displayed_entries().len();
                if count > 0 && self.entry_index < count - 1 {
                    self.entry_index += 1;
                    self.entry_list_state.select(Some(self.entry_index));
                }
            }
            ActivePane::Reading => {
                self.reading_scroll = self.reading_scroll.saturating_add(1);
            }
        }
    }

    /// Keep indices valid after the displayed list shrinks.
    pub fn clamp_indices(&mut self) {
        if self.feed_index >= self.feeds.len() && !self.feeds.is_empty() {
            self.feed_index = self.feeds.len() - 1;
        }
        self.feed_list_state.select(Some(self.feed_index));

        let count = self.displayed_entries().len();
        if self.entry_index >= count && count > 0 {
            self.entry_index = count - 1;
        }
        self.entry_list_state.select(Some(self.entry_index));
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}

impl Default for TuiApp {
    fn default() -> Self {
        Self::new()
    }
}
