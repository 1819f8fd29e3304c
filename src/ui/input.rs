//! Input handling for the TUI.
//!
//! Keys and mouse events are mapped to app navigation or feed transitions.
//! Every transition that asks for a fetch is dispatched immediately.

use crate::app::{App, AppEvent};
use crate::feed::{is_valid_tag, FeedEvent};
use crate::util::validate_url_for_open;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers, MouseEvent, MouseEventKind};
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::helpers::dispatch_fetch;
use super::Action;

/// Longest tag accepted from the prompt.
const MAX_TAG_LENGTH: usize = 64;

/// Rows moved per mouse wheel notch.
const WHEEL_STEP: isize = 3;

/// Main input dispatch function.
pub(super) fn handle_key(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if app.tag_input.is_some() {
        handle_tag_prompt(app, code, event_tx);
        return Ok(Action::Continue);
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(Action::Quit),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            return Ok(Action::Quit)
        }

        // Downward movement doubles as a scroll attempt for the sentinel.
        KeyCode::Char('j') | KeyCode::Down => {
            app.nav_down();
            scrolled_down(app, event_tx);
        }
        KeyCode::Char('d') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.page_down();
            scrolled_down(app, event_tx);
        }
        KeyCode::PageDown | KeyCode::Char(' ') => {
            app.page_down();
            scrolled_down(app, event_tx);
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.jump_end();
            scrolled_down(app, event_tx);
        }
        KeyCode::Char('k') | KeyCode::Up => app.nav_up(),
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => app.page_up(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Char('g') | KeyCode::Home => app.jump_top(),

        KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => select_tag(app, 1, event_tx),
        KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => select_tag(app, -1, event_tx),
        KeyCode::Char('t') | KeyCode::Char('/') => {
            app.tag_input = Some(String::new());
        }

        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            jump_to_page(app, index, event_tx);
        }
        KeyCode::Char('s') => {
            if let Some(per_page) = app.next_page_size() {
                let fetch = app.apply(FeedEvent::SetPageSize { per_page, page: 1 });
                app.set_status(format!("Page size: {}", per_page));
                dispatch_fetch(app, fetch, event_tx);
            }
        }
        KeyCode::Char('r') => {
            let fetch = app.apply(FeedEvent::Reload);
            dispatch_fetch(app, fetch, event_tx);
        }

        KeyCode::Char('o') | KeyCode::Enter => open_selected(app)?,
        _ => {}
    }

    Ok(Action::Continue)
}

/// Mouse wheel scrolls the list; other mouse events are ignored.
pub(super) fn handle_mouse(app: &mut App, mouse: MouseEvent, event_tx: &mpsc::Sender<AppEvent>) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.scroll_lines(WHEEL_STEP);
            scrolled_down(app, event_tx);
        }
        MouseEventKind::ScrollUp => app.scroll_lines(-WHEEL_STEP),
        _ => {}
    }
}

fn scrolled_down(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    let fetch = app.on_scroll(Instant::now());
    dispatch_fetch(app, fetch, event_tx);
}

fn select_tag(app: &mut App, delta: isize, event_tx: &mpsc::Sender<AppEvent>) {
    if let Some(tag) = app.cycle_tag(delta) {
        let fetch = app.apply(FeedEvent::SetTag(tag));
        dispatch_fetch(app, fetch, event_tx);
    }
}

fn jump_to_page(app: &mut App, index: usize, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(page) = app.config.page_jumps.get(index).copied() else {
        return;
    };
    let per_page = app.config.jump_page_size;
    let fetch = app.apply(FeedEvent::SetPageSize { per_page, page });
    dispatch_fetch(app, fetch, event_tx);
}

/// Keys while the tag prompt is open.
fn handle_tag_prompt(app: &mut App, code: KeyCode, event_tx: &mpsc::Sender<AppEvent>) {
    let Some(input) = app.tag_input.as_mut() else {
        return;
    };
    match code {
        KeyCode::Esc => app.tag_input = None,
        KeyCode::Enter => {
            let tag = input.trim().to_string();
            app.tag_input = None;
            if tag.is_empty() {
                return;
            }
            if !is_valid_tag(&tag) {
                app.set_status(format!("Invalid tag: '{}'", tag));
                return;
            }
            let fetch = app.apply(FeedEvent::SetTag(tag));
            dispatch_fetch(app, fetch, event_tx);
        }
        KeyCode::Backspace => {
            input.pop();
        }
        KeyCode::Char(c) if !c.is_control() => {
            if input.chars().count() < MAX_TAG_LENGTH {
                input.push(c);
            }
        }
        _ => {}
    }
}

fn open_selected(app: &mut App) -> Result<()> {
    let Some(post) = app.selected_post() else {
        return Ok(());
    };
    let url = match validate_url_for_open(&post.url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(url = %post.url, error = %e, "Refusing to open post URL");
            app.set_status(format!("Cannot open link: {}", e));
            return Ok(());
        }
    };
    open::that(url.as_str())?;
    app.set_status("Opened in browser");
    Ok(())
}
