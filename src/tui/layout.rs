use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::session::FetchState;
use crate::tui::app::{ActivePane, InputMode, TuiApp};

pub fn render(frame: &mut Frame, app: &mut TuiApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),      // Feeds pane
            Constraint::Percentage(40), // Entries pane
            Constraint::Min(10),        // Reading pane
            Constraint::Length(1),      // Status bar
        ])
        .split(frame.area());

    render_feeds_pane(frame, app, chunks[0]);
    render_entries_pane(frame, app, chunks[1]);
    render_reading_pane(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);
}

fn border_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn render_feeds_pane(frame: &mut Frame, app: &mut TuiApp, area: Rect) {
    let is_active = app.active_pane == ActivePane::Feeds;

    let items: Vec<ListItem> = app
        .feeds
        .iter()
        .enumerate()
        .map(|(i, feed)| {
            let content = if feed.unread_count > 0 {
                format!("{} ({})", feed.display_title(), feed.unread_count)
            } else {
                feed.display_title().to_string()
            };

            let style = if i == app.feed_index && is_active {
                Style::default()
                    .bg(Color::Cyan)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD)
            } else if i == app.feed_index {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };

            ListItem::new(content).style(style)
        })
        .collect();

    let title = format!(" Feeds ({}) ", app.feeds.len());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_active));

    let list = List::new(items).block(block);
    frame.render_stateful_widget(list, area, &mut app.feed_list_state);
}

fn render_entries_pane(frame: &mut Frame, app: &mut TuiApp, area: Rect) {
    let is_active = app.active_pane == ActivePane::Entries;
    let entries = app.displayed_entries();

    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let marker = if entry.is_starred {
                "★"
            } else if !entry.is_read {
                "●"
            } else {
                " "
            };

            let date = entry
                .published
                .map(|d| d.format("%m/%d").to_string())
                .unwrap_or_else(|| "     ".to_string());

            let title = if entry.title.is_empty() {
                "(Untitled)"
            } else {
                &entry.title
            };
            let content = format!("{} {} {}", marker, date, title);

            let base_style = if !entry.is_read {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            let style = if i == app.entry_index && is_active {
                Style::default()
                    .bg(Color::Cyan)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD)
            } else if i == app.entry_index {
                base_style.bg(Color::DarkGray)
            } else {
                base_style
            };

            ListItem::new(content).style(style)
        })
        .collect();

    let (filter, order, query) = app
        .session
        .as_ref()
        .map(|s| (s.filter().label(), s.order().label(), s.query().to_string()))
        .unwrap_or(("all", "by date", String::new()));

    let title = if query.is_empty() {
        format!(" Entries ({}) [{} / {}] ", entries.len(), filter, order)
    } else {
        format!(
            " Entries ({}) [{} / {} / \"{}\"] ",
            entries.len(),
            filter,
            order,
            query
        )
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_active));

    let list = List::new(items).block(block);
    frame.render_stateful_widget(list, area, &mut app.entry_list_state);
}

fn render_reading_pane(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let is_active = app.active_pane == ActivePane::Reading;

    let (title, body) = match &app.reading_entry {
        Some(entry) => {
            let date = entry
                .published
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            let header = format!("{}\n{}  {}\n\n", entry.display_title(), date, entry.url);
            let content = entry.content.as_deref().unwrap_or("(no content)");
            (
                format!(" {} ", entry.display_title()),
                format!("{header}{content}"),
            )
        }
        None => (
            " Reading ".to_string(),
            "Select an entry to read it here.".to_string(),
        ),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_active));

    let paragraph = Paragraph::new(body)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.reading_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &TuiApp, area: Rect) {
    let text = match app.input_mode {
        InputMode::Search => format!("search: {}_", app.input_buffer),
        InputMode::Category => format!("category: {}_", app.input_buffer),
        InputMode::Normal => {
            if let Some(title) = &app.pending_delete {
                format!("Unsubscribe from \"{}\"? (y/n)", title)
            } else if let Some(message) = &app.status_message {
                message.clone()
            } else {
                match app.session.as_ref().map(|s| s.fetch_state()) {
                    Some(FetchState::Updating) => "Updating...".to_string(),
                    _ => {
                        "q quit | Tab pane | Enter open | r read | s star | f filter | u order | \
                         / search | R refresh | M mark all | S star all | D delete"
                            .to_string()
                    }
                }
            }
        }
    };

    let paragraph = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}
