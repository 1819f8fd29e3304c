use crate::config::Config;
use crate::feed::{
    reduce, FeedClient, FeedEvent, FeedState, FetchRequest, Post, ScrollMetrics, ScrollSentinel,
};
use anyhow::Result;
use reqwest::redirect::Policy;
use std::borrow::Cow;
use tokio::time::Instant;

/// Rows taken by one post card: title, meta line, spacer.
pub const CARD_HEIGHT: usize = 3;

/// How long a status message stays on screen.
const STATUS_TTL_SECS: u64 = 3;

// ============================================================================
// Event Types
// ============================================================================

/// Events from background tasks
pub enum AppEvent {
    /// A page fetch finished.
    ///
    /// `generation` is the value the request was issued under; the reducer
    /// drops results whose generation is no longer current.
    PageLoaded {
        generation: u64,
        result: Result<Vec<Post>, String>,
    },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub config: Config,
    pub client: FeedClient,

    /// Pagination state; only ever replaced through [`App::apply`].
    pub feed: FeedState,
    pub sentinel: ScrollSentinel,

    // UI State
    pub selected: usize,
    /// First visible row of the post list.
    pub scroll_offset: usize,
    /// Rows available to the post list, updated on every render.
    pub list_height: usize,
    /// Free-form tag prompt; `Some` while the user is typing.
    pub tag_input: Option<String>,

    pub status_message: Option<(Cow<'static, str>, Instant)>,

    /// Skip frames when nothing changed.
    pub needs_redraw: bool,

    /// Current frame of the loading spinner.
    pub spinner_frame: usize,

    /// Task fetching the current page. Aborted when superseded or on drop.
    pub fetch_handle: Option<tokio::task::JoinHandle<()>>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .redirect(Policy::limited(3))
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .tcp_keepalive(std::time::Duration::from_secs(60))
            .user_agent(concat!("tagfeed/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let client = FeedClient::new(http_client, &config.base_url)?
            .with_timeout(config.request_timeout());
        Ok(Self::with_client(config, client))
    }

    /// Build the app around an existing client (tests point it at a mock server).
    pub fn with_client(config: Config, client: FeedClient) -> Self {
        let feed = FeedState::new(config.default_tag.clone(), config.per_page);
        let sentinel = ScrollSentinel::new(config.scroll_throttle());
        Self {
            config,
            client,
            feed,
            sentinel,
            selected: 0,
            scroll_offset: 0,
            list_height: 0,
            tag_input: None,
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
            fetch_handle: None,
        }
    }

    /// Run `event` through the reducer and return the fetch to issue.
    ///
    /// Transitions that clear the list also reset selection, scroll position
    /// and the sentinel so the new list starts at the top.
    pub fn apply(&mut self, event: FeedEvent) -> Option<FetchRequest> {
        let clears = matches!(
            event,
            FeedEvent::SetTag(_) | FeedEvent::SetPageSize { .. }
        );
        let state = std::mem::take(&mut self.feed);
        let (state, fetch) = reduce(state, event);
        self.feed = state;

        if clears {
            self.selected = 0;
            self.scroll_offset = 0;
            self.sentinel.reset();
        }
        self.clamp_selection();
        self.needs_redraw = true;
        fetch
    }

    // ------------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------------

    pub fn content_height(&self) -> usize {
        self.feed.posts.len() * CARD_HEIGHT
    }

    pub fn scroll_metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            viewport_height: self.list_height,
            scroll_offset: self.scroll_offset,
            content_height: self.content_height(),
        }
    }

    /// Feed a downward scroll attempt to the sentinel.
    ///
    /// Returns the next-page fetch when the bottom was reached outside the
    /// throttle window.
    pub fn on_scroll(&mut self, now: Instant) -> Option<FetchRequest> {
        if self.sentinel.observe(self.scroll_metrics(), now) {
            tracing::debug!(
                page = self.feed.page,
                posts = self.feed.posts.len(),
                "Bottom reached, advancing page"
            );
            self.apply(FeedEvent::AdvancePage)
        } else {
            None
        }
    }

    pub fn nav_down(&mut self) {
        if self.selected + 1 < self.feed.posts.len() {
            self.selected += 1;
        }
        self.ensure_selected_visible();
    }

    pub fn nav_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.ensure_selected_visible();
    }

    /// Move the selection by a viewport's worth of cards.
    pub fn page_down(&mut self) {
        let step = (self.list_height / CARD_HEIGHT).max(1);
        self.selected = (self.selected + step).min(self.feed.posts.len().saturating_sub(1));
        self.ensure_selected_visible();
    }

    pub fn page_up(&mut self) {
        let step = (self.list_height / CARD_HEIGHT).max(1);
        self.selected = self.selected.saturating_sub(step);
        self.ensure_selected_visible();
    }

    pub fn jump_top(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn jump_end(&mut self) {
        self.selected = self.feed.posts.len().saturating_sub(1);
        self.ensure_selected_visible();
    }

    /// Scroll the viewport by `lines` rows (mouse wheel), dragging the
    /// selection along when it leaves the view.
    pub fn scroll_lines(&mut self, lines: isize) {
        self.scroll_offset = self.scroll_offset.saturating_add_signed(lines);
        self.clamp_scroll();
        if self.feed.posts.is_empty() {
            return;
        }
        let first_visible = self.scroll_offset.div_ceil(CARD_HEIGHT);
        let last_visible = ((self.scroll_offset + self.list_height) / CARD_HEIGHT).saturating_sub(1);
        if self.selected < first_visible {
            self.selected = first_visible.min(self.feed.posts.len() - 1);
        } else if self.selected > last_visible {
            self.selected = last_visible.max(first_visible);
        }
    }

    fn ensure_selected_visible(&mut self) {
        let top = self.selected * CARD_HEIGHT;
        let bottom = top + CARD_HEIGHT;
        if top < self.scroll_offset {
            self.scroll_offset = top;
        } else if bottom > self.scroll_offset + self.list_height {
            self.scroll_offset = bottom.saturating_sub(self.list_height);
        }
        self.clamp_scroll();
    }

    /// Keep the offset inside `[0, content - viewport]`.
    pub fn clamp_scroll(&mut self) {
        let max_scroll = self.content_height().saturating_sub(self.list_height);
        self.scroll_offset = self.scroll_offset.min(max_scroll);
    }

    pub fn clamp_selection(&mut self) {
        self.selected = self
            .selected
            .min(self.feed.posts.len().saturating_sub(1));
        self.clamp_scroll();
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.feed.posts.get(self.selected)
    }

    // ------------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------------

    /// Position of the current tag in the tag bar, if it is one of the presets.
    pub fn current_tag_index(&self) -> Option<usize> {
        self.config.tags.iter().position(|t| *t == self.feed.tag)
    }

    /// Tag `delta` steps away from the current one, wrapping around.
    pub fn cycle_tag(&self, delta: isize) -> Option<String> {
        let len = self.config.tags.len();
        if len == 0 {
            return None;
        }
        let next = match self.current_tag_index() {
            Some(i) => (i as isize + delta).rem_euclid(len as isize) as usize,
            None if delta < 0 => len - 1,
            None => 0,
        };
        self.config.tags.get(next).cloned()
    }

    /// Page size after the one in use, cycling through `config.page_sizes`.
    ///
    /// The position comes from `feed.per_page`, since tag changes and page
    /// jumps set the size without going through the cycle. A size outside
    /// the list restarts the cycle at its first entry.
    pub fn next_page_size(&self) -> Option<u32> {
        let sizes = &self.config.page_sizes;
        let next = match sizes.iter().position(|n| *n == self.feed.per_page) {
            Some(i) => (i + 1) % sizes.len(),
            None => 0,
        };
        sizes.get(next).copied()
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired.
    /// Returns true if a message was actually cleared
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

// ============================================================================
// Resource Cleanup
// ============================================================================

/// Abort the in-flight fetch so it does not outlive the event loop.
impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.fetch_handle.take() {
            handle.abort();
            tracing::debug!("Aborted fetch task on App drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Author, DEFAULT_BASE_URL};
    use chrono::DateTime;
    use std::time::Duration;
    use tokio::time;

    fn test_app() -> App {
        let config = Config::default();
        let client = FeedClient::new(reqwest::Client::new(), DEFAULT_BASE_URL).unwrap();
        let mut app = App::with_client(config, client);
        app.list_height = 30; // 10 cards
        app
    }

    fn posts(n: usize) -> Vec<Post> {
        (0..n)
            .map(|i| Post {
                id: i.to_string(),
                title: format!("Post {}", i),
                url: format!("https://qiita.com/items/{}", i),
                created_at: DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap(),
                likes_count: 0,
                tags: Vec::new(),
                user: Author {
                    id: "u".to_string(),
                    profile_image_url: String::new(),
                    items_count: 1,
                },
            })
            .collect()
    }

    fn load(app: &mut App, n: usize) {
        let generation = app.feed.generation;
        app.apply(FeedEvent::PageLoaded {
            generation,
            result: Ok(posts(n)),
        });
    }

    #[tokio::test]
    async fn test_start_uses_config_defaults() {
        let mut app = test_app();
        let fetch = app.apply(FeedEvent::Start).unwrap();
        assert_eq!(fetch.tag, "React");
        assert_eq!(fetch.per_page, 20);
        assert!(app.feed.is_loading);
    }

    #[tokio::test]
    async fn test_nav_empty_list() {
        let mut app = test_app();
        app.nav_down();
        app.nav_up();
        assert_eq!(app.selected, 0);
        assert!(app.selected_post().is_none());
    }

    #[tokio::test]
    async fn test_nav_down_scrolls_to_keep_selection_visible() {
        let mut app = test_app();
        app.apply(FeedEvent::Start);
        load(&mut app, 20);
        for _ in 0..12 {
            app.nav_down();
        }
        assert_eq!(app.selected, 12);
        // Card 12 occupies rows 36..39; viewport is 30 rows.
        assert_eq!(app.scroll_offset, 9);
    }

    #[tokio::test]
    async fn test_scroll_at_bottom_advances_once_per_interval() {
        let mut app = test_app();
        app.apply(FeedEvent::Start);
        load(&mut app, 20);
        app.jump_end();
        assert!(app.scroll_metrics().is_at_bottom());

        let t0 = Instant::now();
        let fetch = app.on_scroll(t0);
        assert_eq!(fetch.map(|f| f.page), Some(2));
        load(&mut app, 20);
        app.jump_end();

        assert!(app.on_scroll(t0 + Duration::from_millis(100)).is_none());
        assert_eq!(app.feed.page, 2);
    }

    #[tokio::test]
    async fn test_scroll_in_middle_does_nothing() {
        let mut app = test_app();
        app.apply(FeedEvent::Start);
        load(&mut app, 20);
        assert!(app.on_scroll(Instant::now()).is_none());
        assert_eq!(app.feed.page, 1);
    }

    #[tokio::test]
    async fn test_set_tag_resets_view() {
        let mut app = test_app();
        app.apply(FeedEvent::Start);
        load(&mut app, 20);
        app.jump_end();
        let fetch = app.apply(FeedEvent::SetTag("Swift".to_string())).unwrap();
        assert_eq!(fetch.tag, "Swift");
        assert_eq!(app.selected, 0);
        assert_eq!(app.scroll_offset, 0);
        assert!(app.feed.posts.is_empty());
    }

    #[tokio::test]
    async fn test_scroll_lines_drags_selection() {
        let mut app = test_app();
        app.apply(FeedEvent::Start);
        load(&mut app, 20);
        app.scroll_lines(15);
        assert_eq!(app.scroll_offset, 15);
        assert_eq!(app.selected, 5);
        app.scroll_lines(-100);
        assert_eq!(app.scroll_offset, 0);
    }

    #[tokio::test]
    async fn test_cycle_tag_wraps() {
        let mut app = test_app();
        assert_eq!(app.cycle_tag(1).as_deref(), Some("Next.js"));
        assert_eq!(app.cycle_tag(-1).as_deref(), Some("Flutter"));
        app.apply(FeedEvent::SetTag("Rust".to_string()));
        assert_eq!(app.current_tag_index(), None);
        assert_eq!(app.cycle_tag(1).as_deref(), Some("React"));
    }

    #[tokio::test]
    async fn test_next_page_size_cycles() {
        let mut app = test_app();
        let mut seen = Vec::new();
        for _ in 0..3 {
            let per_page = app.next_page_size().unwrap();
            app.apply(FeedEvent::SetPageSize { per_page, page: 1 });
            seen.push(per_page);
        }
        assert_eq!(seen, vec![50, 100, 20]);
    }

    #[tokio::test]
    async fn test_next_page_size_empty_list() {
        let mut app = test_app();
        app.config.page_sizes.clear();
        assert_eq!(app.next_page_size(), None);
    }

    #[tokio::test]
    async fn test_next_page_size_follows_current_size() {
        let mut app = test_app();
        assert_eq!(app.next_page_size(), Some(50));
        app.apply(FeedEvent::SetPageSize {
            per_page: 50,
            page: 1,
        });

        // Tag change restores 20, so the cycle continues from 20.
        app.apply(FeedEvent::SetTag("Vim".to_string()));
        assert_eq!(app.next_page_size(), Some(50));

        // A page jump uses 100, which is the last entry.
        app.apply(FeedEvent::SetPageSize {
            per_page: 100,
            page: 20,
        });
        assert_eq!(app.next_page_size(), Some(20));

        // Sizes outside the list restart at the first entry.
        app.apply(FeedEvent::SetPageSize {
            per_page: 7,
            page: 1,
        });
        assert_eq!(app.next_page_size(), Some(20));
    }

    #[tokio::test]
    async fn test_status_expires_after_3_seconds() {
        time::pause();
        let mut app = test_app();
        app.set_status("Test message");
        assert!(app.status_message.is_some());

        time::advance(Duration::from_secs(4)).await;
        assert!(app.clear_expired_status());
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_status_not_expired_before_3_seconds() {
        time::pause();
        let mut app = test_app();
        app.set_status("Test message");

        time::advance(Duration::from_secs(2)).await;
        assert!(!app.clear_expired_status());
        assert!(app.status_message.is_some());
    }
}
