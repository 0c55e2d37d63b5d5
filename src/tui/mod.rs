pub mod app;
pub mod event;
pub mod layout;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use crossterm::event::KeyCode;
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::{AppContext, Result};
use crate::session::{EntryListSession, FetchState};
use crate::store::Store;

use self::app::{ActivePane, InputMode, TuiApp};
use self::event::{Action, AppEvent, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(terminal: &mut Tui, ctx: Arc<AppContext>) -> Result<()> {
    let mut tui_app = TuiApp::new();
    let event_handler = EventHandler::new(Duration::from_millis(100));
    let mut last_fetch_state = FetchState::Idle;

    load_feeds(&mut tui_app, &ctx)?;

    loop {
        terminal.draw(|frame| layout::render(frame, &mut tui_app))?;

        match event_handler.next()? {
            AppEvent::Key(key) => {
                if tui_app.input_mode != InputMode::Normal {
                    handle_input_key(&mut tui_app, key.code)?;
                } else if tui_app.pending_delete.is_some() {
                    handle_delete_confirmation(&mut tui_app, &ctx, key.code)?;
                } else {
                    handle_action(&mut tui_app, &ctx, Action::from(key))?;
                }
            }
            AppEvent::Tick => {}
        }

        // Drain store events and fetch outcomes for the active session.
        if let Some(session) = tui_app.session.as_mut() {
            if session.pump()? {
                load_feeds(&mut tui_app, &ctx)?;
            }
            let fetch_state = tui_app
                .session
                .as_ref()
                .map(|s| s.fetch_state())
                .unwrap_or_default();
            if fetch_state != last_fetch_state {
                if let FetchState::Done { added, updated } = &fetch_state {
                    tui_app.set_status(format!("{} added, {} updated", added, updated));
                }
                if let FetchState::Failed(message) = &fetch_state {
                    tui_app.set_status(format!("Refresh failed: {}", message));
                }
                last_fetch_state = fetch_state;
            }
        }
        tui_app.clamp_indices();

        if tui_app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_action(tui_app: &mut TuiApp, ctx: &Arc<AppContext>, action: Action) -> Result<()> {
    match action {
        Action::Quit => {
            close_reading(tui_app)?;
            tui_app.should_quit = true;
        }
        Action::MoveUp => tui_app.move_up(),
        Action::MoveDown => tui_app.move_down(),
        Action::NextPane => tui_app.active_pane = tui_app.active_pane.next(),
        Action::PrevPane => tui_app.active_pane = tui_app.active_pane.prev(),
        Action::Select => match tui_app.active_pane {
            ActivePane::Feeds => open_selected_feed(tui_app, ctx)?,
            ActivePane::Entries => open_selected_entry(tui_app, ctx)?,
            ActivePane::Reading => {}
        },
        Action::Back => match tui_app.active_pane {
            ActivePane::Reading => {
                close_reading(tui_app)?;
                tui_app.active_pane = ActivePane::Entries;
            }
            ActivePane::Entries => {
                let has_query = tui_app
                    .session
                    .as_ref()
                    .is_some_and(|s| !s.query().is_empty());
                if has_query {
                    if let Some(session) = tui_app.session.as_mut() {
                        session.submit_query("");
                    }
                } else {
                    tui_app.active_pane = ActivePane::Feeds;
                }
            }
            ActivePane::Feeds => {}
        },
        Action::ToggleRead => {
            if let Some(entry) = tui_app.selected_entry() {
                if let Some(session) = tui_app.session.as_mut() {
                    session.set_entry_read(&entry.url, !entry.is_read)?;
                }
            }
        }
        Action::ToggleStar => {
            if let Some(entry) = tui_app.selected_entry() {
                if let Some(session) = tui_app.session.as_mut() {
                    session.set_entry_starred(&entry.url, !entry.is_starred)?;
                }
            }
        }
        Action::MarkAll => {
            if let Some(session) = tui_app.session.as_mut() {
                let marking = !session.all_read();
                session.mark_all_current_read()?;
                tui_app.set_status(if marking {
                    "Marked all visible entries read".into()
                } else {
                    "Marked all visible entries unread".into()
                });
            }
        }
        Action::StarAll => {
            if let Some(session) = tui_app.session.as_mut() {
                let starring = !session.all_starred();
                session.star_all_current()?;
                tui_app.set_status(if starring {
                    "Starred all visible entries".into()
                } else {
                    "Unstarred all visible entries".into()
                });
            }
        }
        Action::CycleFilter => {
            if let Some(session) = tui_app.session.as_mut() {
                let next = session.filter().next();
                session.set_filter(next);
                tui_app.entry_index = 0;
            }
        }
        Action::ToggleOrder => {
            if let Some(session) = tui_app.session.as_mut() {
                let next = session.order().toggled();
                session.set_order(next);
            }
        }
        Action::Search => {
            if tui_app.session.is_some() {
                tui_app.input_buffer = tui_app
                    .session
                    .as_ref()
                    .map(|s| s.query().to_string())
                    .unwrap_or_default();
                tui_app.input_mode = InputMode::Search;
            }
        }
        Action::EditCategory => {
            if tui_app.session.is_some() {
                tui_app.input_buffer.clear();
                tui_app.input_mode = InputMode::Category;
            }
        }
        Action::Refresh => {
            if let Some(session) = tui_app.session.as_mut() {
                // A manual refresh drops the active query first.
                session.submit_query("");
                session.request_refresh();
                tui_app.clear_status();
            }
        }
        Action::OpenInBrowser => {
            if let Some(entry) = tui_app.selected_entry() {
                if let Err(e) = open::that(&entry.url) {
                    tui_app.set_status(format!("Failed to open browser: {}", e));
                } else if let Some(session) = tui_app.session.as_mut() {
                    session.set_entry_read(&entry.url, true)?;
                }
            }
        }
        Action::DeleteFeed => {
            if let Some(feed) = tui_app.session.as_ref().and_then(|s| s.feed()) {
                tui_app.pending_delete = Some(feed.display_title().to_string());
            }
        }
        Action::None => {}
    }
    Ok(())
}

fn handle_input_key(tui_app: &mut TuiApp, code: KeyCode) -> Result<()> {
    match code {
        KeyCode::Esc => {
            tui_app.input_mode = InputMode::Normal;
            tui_app.input_buffer.clear();
        }
        KeyCode::Backspace => {
            tui_app.input_buffer.pop();
        }
        KeyCode::Enter => {
            let buffer = std::mem::take(&mut tui_app.input_buffer);
            let mode = tui_app.input_mode;
            tui_app.input_mode = InputMode::Normal;
            if let Some(session) = tui_app.session.as_mut() {
                match mode {
                    InputMode::Search => {
                        session.submit_query(&buffer);
                        tui_app.entry_index = 0;
                    }
                    InputMode::Category => {
                        session.update_category(&buffer)?;
                        if buffer.is_empty() {
                            tui_app.set_status("Category cleared".into());
                        } else {
                            tui_app.set_status(format!("Category set to \"{}\"", buffer));
                        }
                    }
                    InputMode::Normal => {}
                }
            }
        }
        KeyCode::Char(c) => {
            tui_app.input_buffer.push(c);
        }
        _ => {}
    }
    Ok(())
}

fn handle_delete_confirmation(
    tui_app: &mut TuiApp,
    ctx: &Arc<AppContext>,
    code: KeyCode,
) -> Result<()> {
    match code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            let title = tui_app.pending_delete.take();
            if let Some(session) = tui_app.session.as_mut() {
                session.delete_feed_and_entries()?;
            }
            tui_app.session = None;
            tui_app.reading_entry = None;
            tui_app.active_pane = ActivePane::Feeds;
            load_feeds(tui_app, ctx)?;
            if let Some(title) = title {
                tui_app.set_status(format!("Unsubscribed from \"{}\"", title));
            }
        }
        _ => {
            tui_app.pending_delete = None;
        }
    }
    Ok(())
}

fn open_selected_feed(tui_app: &mut TuiApp, ctx: &Arc<AppContext>) -> Result<()> {
    let Some(feed) = tui_app.selected_feed() else {
        return Ok(());
    };
    let feed_url = feed.url.clone();

    close_reading(tui_app)?;
    let mut session = EntryListSession::new(
        ctx.store.clone(),
        ctx.fetcher.clone(),
        feed_url,
        ctx.config.default_filter,
        ctx.config.entries_order,
    )?;
    if ctx.config.auto_refresh {
        session.request_refresh();
    }

    tui_app.session = Some(session);
    tui_app.entry_index = 0;
    tui_app.scroll_positions.clear();
    tui_app.active_pane = ActivePane::Entries;
    tui_app.clear_status();
    Ok(())
}

fn open_selected_entry(tui_app: &mut TuiApp, ctx: &Arc<AppContext>) -> Result<()> {
    let Some(minimal) = tui_app.selected_entry() else {
        return Ok(());
    };

    // Leaving a previously open entry marks it read.
    close_reading(tui_app)?;

    tui_app.reading_entry = ctx.store.get_entry(&minimal.url)?;
    tui_app.reading_scroll = tui_app
        .scroll_positions
        .get(&minimal.url)
        .copied()
        .unwrap_or(0);
    tui_app.active_pane = ActivePane::Reading;
    Ok(())
}

/// Cache the scroll position and mark the entry read on the way out.
fn close_reading(tui_app: &mut TuiApp) -> Result<()> {
    let Some(entry) = tui_app.reading_entry.take() else {
        return Ok(());
    };
    tui_app
        .scroll_positions
        .insert(entry.url.clone(), tui_app.reading_scroll);
    tui_app.reading_scroll = 0;
    if let Some(session) = tui_app.session.as_mut() {
        session.set_entry_read(&entry.url, true)?;
    }
    Ok(())
}

fn load_feeds(tui_app: &mut TuiApp, ctx: &Arc<AppContext>) -> Result<()> {
    tui_app.feeds = ctx.store.get_all_feeds()?;
    Ok(())
}
