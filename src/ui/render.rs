//! Render functions for the TUI.
//!
//! One screen, top to bottom: error line, tag bar, page controls, post list,
//! loading line, status bar.

use crate::app::App;
use crate::feed::{FeedState, Phase};
use crate::util::{strip_control_chars, truncate_to_width};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{posts, status};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 40;
pub(super) const MIN_HEIGHT: u16 = 10;

const SPINNER: [char; super::loop_runner::SPINNER_FRAMES] =
    ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Main render function.
///
/// Records the post list height on `app` so scrolling and the bottom
/// sentinel measure against what is actually on screen.
pub(super) fn render(f: &mut Frame, app: &mut App) {
    let area = f.area();

    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {}x{}\nCurrent: {}x{}",
                MIN_WIDTH, MIN_HEIGHT, area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // error
            Constraint::Length(1), // tags
            Constraint::Length(1), // page controls
            Constraint::Min(0),    // posts
            Constraint::Length(1), // loading line
            Constraint::Length(1), // status bar
        ])
        .split(area);

    render_error(f, app, chunks[0]);
    render_tag_bar(f, app, chunks[1]);
    render_controls(f, app, chunks[2]);

    app.list_height = chunks[3].height as usize;
    app.clamp_scroll();
    posts::render(f, app, chunks[3]);

    let loading = Paragraph::new(loading_line(&app.feed, app.spinner_frame))
        .style(Style::default().fg(Color::Gray));
    f.render_widget(loading, chunks[4]);

    status::render(f, app, chunks[5]);
}

/// `Loading .... page: 3/20posts/41-` or `Not Loading. page: 3/20posts/41-`.
pub(super) fn loading_line(feed: &FeedState, spinner_frame: usize) -> String {
    let position = format!(
        "page: {}/{}posts/{}-",
        feed.page,
        feed.per_page,
        feed.first_index()
    );
    match feed.phase() {
        Phase::Loading => format!(
            "{} Loading .... {}",
            SPINNER[spinner_frame % SPINNER.len()],
            position
        ),
        // The failure message has its own line above the list.
        Phase::Idle | Phase::Error => format!("Not Loading. {}", position),
    }
}

fn render_error(f: &mut Frame, app: &App, area: Rect) {
    let Some(error) = &app.feed.error else {
        return;
    };
    let text = strip_control_chars(error);
    let text = truncate_to_width(&text, area.width as usize);
    let paragraph = Paragraph::new(text.into_owned()).style(
        Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(paragraph, area);
}

/// Configured tags, current one highlighted. A free-form tag that is not in
/// the list is shown first so the bar always names what is being viewed.
fn render_tag_bar(f: &mut Frame, app: &App, area: Rect) {
    let current = Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let other = Style::default().fg(Color::Cyan);

    let mut spans = Vec::with_capacity(app.config.tags.len() * 2 + 2);
    if app.current_tag_index().is_none() {
        spans.push(Span::styled(
            format!(" {} ", strip_control_chars(&app.feed.tag)),
            current,
        ));
        spans.push(Span::raw(" "));
    }
    for tag in &app.config.tags {
        let style = if *tag == app.feed.tag { current } else { other };
        spans.push(Span::styled(format!(" {} ", tag), style));
        spans.push(Span::raw(" "));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// `page: [1]1 [2]20 [3]50 [4]90  3/20posts  [s]ize`
fn render_controls(f: &mut Frame, app: &App, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let active = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let mut spans = vec![Span::raw("page: ")];
    for (i, page) in app.config.page_jumps.iter().enumerate().take(9) {
        spans.push(Span::styled(format!("[{}]", i + 1), key));
        let on_page = app.feed.page == *page && app.feed.per_page == app.config.jump_page_size;
        let style = if on_page { active } else { Style::default() };
        spans.push(Span::styled(page.to_string(), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(format!(
        " {}/{}posts  ",
        app.feed.page, app.feed.per_page
    )));
    spans.push(Span::styled("[s]", key));
    spans.push(Span::raw("ize"));

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
