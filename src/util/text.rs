use chrono::{DateTime, FixedOffset, Utc};
use std::borrow::Cow;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";

/// Display width of `s` in terminal columns (CJK and emoji count as 2).
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate `s` to at most `max_width` columns, appending "..." when cut.
///
/// Returns the input borrowed when it already fits. Widths too narrow for
/// the ellipsis get a plain hard cut.
///
/// ```
/// use tagfeed::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("日本語の記事", 7), "日本...");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let ellipsis_width = display_width(ELLIPSIS);
    let (budget, suffix) = if max_width > ellipsis_width {
        (max_width - ellipsis_width, ELLIPSIS)
    } else {
        (max_width, "")
    };

    let mut used = 0;
    let mut out = String::with_capacity(budget + suffix.len());
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str(suffix);
    Cow::Owned(out)
}

/// Remove terminal control characters and ANSI escape sequences.
///
/// Titles and tag names come from third-party authors, so they are scrubbed
/// before they reach the terminal. Tabs become spaces; newlines are dropped.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(|c| c.is_control()) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => match chars.peek().copied() {
                // CSI: parameters until a final byte in 0x40..=0x7e
                Some('[') => {
                    chars.next();
                    for n in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&n) {
                            break;
                        }
                    }
                }
                // OSC: until BEL or ESC '\'
                Some(']') => {
                    chars.next();
                    while let Some(n) = chars.next() {
                        if n == '\x07' {
                            break;
                        }
                        if n == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            '\t' => out.push(' '),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Age of a post without suffix: "a few seconds", "5 minutes", "a day", "3 years".
///
/// Thresholds follow the usual humanized scale: 45s, 90s, 45m, 90m, 22h,
/// 36h, 26d, 45d, 320d, 548d. Future timestamps read as "a few seconds".
pub fn format_age(created_at: &DateTime<FixedOffset>, now: DateTime<Utc>) -> String {
    let secs = (now - created_at.with_timezone(&Utc)).num_seconds().max(0);

    let round_div = |value: i64, unit: i64| (value + unit / 2) / unit;

    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    match secs {
        s if s < 45 => "a few seconds".to_string(),
        s if s < 90 => "a minute".to_string(),
        s if s < 45 * MINUTE => format!("{} minutes", round_div(s, MINUTE).max(2)),
        s if s < 90 * MINUTE => "an hour".to_string(),
        s if s < 22 * HOUR => format!("{} hours", round_div(s, HOUR).max(2)),
        s if s < 36 * HOUR => "a day".to_string(),
        s if s < 26 * DAY => format!("{} days", round_div(s, DAY).max(2)),
        s if s < 46 * DAY => "a month".to_string(),
        s if s < 320 * DAY => format!("{} months", round_div(s, 30 * DAY).max(2)),
        s if s < 548 * DAY => "a year".to_string(),
        s => format!("{} years", round_div(s, 365 * DAY).max(2)),
    }
}
