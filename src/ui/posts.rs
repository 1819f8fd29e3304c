use crate::app::{App, CARD_HEIGHT};
use crate::feed::Post;
use crate::util::{format_age, strip_control_chars, truncate_to_width};
use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the post card list, scrolled by `app.scroll_offset` rows.
///
/// Only cards that intersect the viewport are built.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    if app.feed.posts.is_empty() {
        let msg = if app.feed.is_loading {
            "Loading posts...".to_string()
        } else if app.feed.error.is_some() {
            "No posts".to_string()
        } else {
            format!("No posts tagged {}", strip_control_chars(&app.feed.tag))
        };
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(paragraph, area);
        return;
    }

    let first_card = app.scroll_offset / CARD_HEIGHT;
    let visible_cards = (area.height as usize).div_ceil(CARD_HEIGHT) + 1;
    let now = Utc::now();
    let width = area.width as usize;

    let lines: Vec<Line> = app
        .feed
        .posts
        .iter()
        .enumerate()
        .skip(first_card)
        .take(visible_cards)
        .flat_map(|(i, post)| card_lines(post, i == app.selected, width, now))
        .collect();

    let skip_rows = (app.scroll_offset - first_card * CARD_HEIGHT) as u16;
    f.render_widget(Paragraph::new(lines).scroll((skip_rows, 0)), area);
}

/// One card: title, meta line, spacer.
fn card_lines(post: &Post, selected: bool, width: usize, now: DateTime<Utc>) -> [Line<'static>; CARD_HEIGHT] {
    let marker = if selected { "> " } else { "  " };
    let title_style = if selected {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let title = strip_control_chars(&post.title);
    let title = truncate_to_width(&title, width.saturating_sub(marker.len())).into_owned();

    let meta = format!(
        "{} · {} ago · ♥ {} · {} posts · {}",
        strip_control_chars(&post.user.id),
        format_age(&post.created_at, now),
        post.likes_count,
        post.user.items_count,
        strip_control_chars(&post.tag_names()),
    );
    let meta = truncate_to_width(&meta, width.saturating_sub(2)).into_owned();

    [
        Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Cyan)),
            Span::styled(title, title_style),
        ]),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(meta, Style::default().fg(Color::Gray)),
        ]),
        Line::default(),
    ]
}
