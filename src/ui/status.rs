use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};
use std::borrow::Cow;

const HINTS: &str = "[j/k]move [h/l]tag [t]ype tag [1-4]jump [s]ize [r]eload [o]pen [q]uit";
const PROMPT_HINTS: &str = "ENTER confirm | ESC cancel";

/// Render the status bar: tag prompt, transient message, or key hints.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some(input) = &app.tag_input {
        Cow::Owned(format!("Tag: {}_  ({})", input, PROMPT_HINTS))
    } else if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else {
        Cow::Borrowed(HINTS)
    };

    let style = Style::default().bg(Color::DarkGray).fg(Color::White);
    f.render_widget(Paragraph::new(text).style(style), area);
}
